//! Shared value types passed between the grouper, validator, selector,
//! assembler and publishers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// Groups keyed by basename, in sorted order.
pub type GroupMap = BTreeMap<String, PostGroup>;

/// Snapshot of basenames already recorded in the ledger.
pub type PostedSet = BTreeSet<String>;

/// What a post carries besides its caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// No media: a caption-only post.
    Text,
    Image,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Text => f.write_str("text"),
            MediaKind::Image => f.write_str("image"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// One image or video belonging to a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    /// Either [`MediaKind::Image`] or [`MediaKind::Video`].
    pub kind: MediaKind,
    /// Position index from a `-N` suffix, `None` for the unnumbered file.
    pub index: Option<u32>,
}

/// Structural problem found while grouping files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Defect {
    /// Two files claim the same place in the group (e.g. `a.jpg` and
    /// `a-1.jpg`, or `a.jpg` and `a.png`).
    Ambiguous { path: PathBuf },
    /// A caption or alt-text file could not be read as UTF-8 text.
    UnreadableText { path: PathBuf, reason: String },
}

/// All files sharing one basename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostGroup {
    pub basename: String,
    /// Unnumbered file first, then ascending index.
    pub media_files: Vec<MediaFile>,
    pub caption_text: Option<String>,
    pub alt_text: Option<String>,
    /// Every source file that contributed to this group, sorted.
    pub files: Vec<PathBuf>,
    pub defects: Vec<Defect>,
}

impl PostGroup {
    pub fn new(basename: impl Into<String>) -> Self {
        Self {
            basename: basename.into(),
            ..Self::default()
        }
    }

    /// Kind shared by every media file, [`MediaKind::Text`] when there is no
    /// media, or `None` when images and video are mixed.
    pub fn media_kind(&self) -> Option<MediaKind> {
        let mut kinds = self.media_files.iter().map(|m| m.kind);
        let Some(first) = kinds.next() else {
            return Some(MediaKind::Text);
        };
        kinds.all(|k| k == first).then_some(first)
    }

    pub fn count_of(&self, kind: MediaKind) -> usize {
        self.media_files.iter().filter(|m| m.kind == kind).count()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.defects
            .iter()
            .any(|d| matches!(d, Defect::Ambiguous { .. }))
    }
}

/// A fully assembled, platform-agnostic post.
///
/// `alt_texts` is aligned by index with `media`; slots without alt text hold
/// an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostUnit {
    pub basename: String,
    pub kind: MediaKind,
    pub media: Vec<PathBuf>,
    pub caption: String,
    pub alt_texts: Vec<String>,
}

/// What a publisher reports back after a successful post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReceipt {
    pub publisher: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
}
