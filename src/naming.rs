//! Filename classification for the `<basename>[-<index>].<ext>` convention.
//!
//! Every file in the posts directory is classified exactly once into a
//! [`Role`] before grouping, so the grouper works on structured tags instead
//! of re-inspecting strings:
//!
//! - `trip.jpg` → `Image(None)`, basename `trip`
//! - `trip-2.jpg` → `Image(Some(2))`, basename `trip`
//! - `clip.mp4` → `Video(None)`, basename `clip`
//! - `trip.txt` → `Caption`, basename `trip`
//! - `trip-alt.txt` → `Alt`, basename `trip`
//!
//! The `-alt` marker is only meaningful on text files and the numeric index
//! only on media files: `trip-alt.jpg` is an unnumbered image with basename
//! `trip-alt`, and `trip-2.txt` is the caption of a group named `trip-2`.

use std::path::Path;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov"];
pub const TEXT_EXTENSIONS: &[&str] = &["txt"];

const ALT_SUFFIX: &str = "-alt";

/// The role a single file plays inside its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Image, optionally carrying a 1-based position index.
    Image(Option<u32>),
    /// Video, optionally carrying a position index.
    Video(Option<u32>),
    /// Post caption (`<basename>.txt`).
    Caption,
    /// Image alt text (`<basename>-alt.txt`).
    Alt,
}

/// Result of classifying one filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub basename: String,
    pub role: Role,
}

/// Why a file with a recognized extension could not be classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unclassifiable {
    /// Hidden file, no extension, or an extension we don't post.
    Ignored,
    /// Basename is empty or can't be stored as a single ledger line.
    BadBasename(String),
}

/// Classify a path by its file name.
pub fn classify(path: &Path) -> Result<Classified, Unclassifiable> {
    let Some(file_name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return Err(Unclassifiable::Ignored);
    };
    if file_name.starts_with('.') {
        return Err(Unclassifiable::Ignored);
    }
    let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
        return Err(Unclassifiable::Ignored);
    };
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let (basename, role) = if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        match stem.strip_suffix(ALT_SUFFIX) {
            Some(base) => (base.to_string(), Role::Alt),
            None => (stem, Role::Caption),
        }
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        let (base, index) = split_index(&stem);
        (base, Role::Image(index))
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        let (base, index) = split_index(&stem);
        (base, Role::Video(index))
    } else {
        return Err(Unclassifiable::Ignored);
    };

    let basename = basename.trim().to_string();
    if basename.is_empty() || basename.contains(['\n', '\r']) {
        return Err(Unclassifiable::BadBasename(file_name.to_string()));
    }
    Ok(Classified { basename, role })
}

/// Split a trailing `-<digits>` media index off a stem.
///
/// - `"trip-2"` → (`"trip"`, Some(2))
/// - `"2024-01-05"` → (`"2024-01"`, Some(5))
/// - `"trip"` → (`"trip"`, None)
/// - `"-3"` → (`"-3"`, None): nothing left to name the group
/// - `"trip-"` → (`"trip-"`, None)
fn split_index(stem: &str) -> (String, Option<u32>) {
    if let Some((base, digits)) = stem.rsplit_once('-')
        && !base.is_empty()
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && let Ok(index) = digits.parse::<u32>()
    {
        return (base.to_string(), Some(index));
    }
    (stem.to_string(), None)
}
