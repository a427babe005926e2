//! Asset grouping: turn a flat posts directory into [`PostGroup`]s.
//!
//! ## Directory Structure
//!
//! ```text
//! posts/
//! ├── trip-1.jpg          # first image of "trip"
//! ├── trip-2.jpg          # second image of "trip"
//! ├── trip.txt            # caption of "trip"
//! ├── trip-alt.txt        # alt text for the images of "trip"
//! ├── clip.mp4            # single-video post "clip"
//! ├── clip.txt
//! ├── thought.txt         # caption-only post "thought"
//! └── notes.md            # unrecognized extension, ignored
//! ```
//!
//! Scanning is non-recursive: subdirectories (such as an archive of already
//! posted files) are never looked at.
//!
//! ## Grouping Rules
//!
//! - Files are classified by [`naming::classify`] and accumulated by basename.
//! - Media files are ordered unnumbered first, then by ascending index.
//! - Two media files claiming the same slot, or an unnumbered and a numbered
//!   file of the same kind, mark the group ambiguous. Both files are kept in
//!   the group so the validator can reject it with the full picture.
//! - Caption and alt text are read here, trimmed; empty files count as absent.
//!   An unreadable text file is recorded as a defect on its group rather than
//!   failing the whole scan.

use crate::naming::{self, Role, Unclassifiable};
use crate::types::{Defect, GroupMap, MediaFile, MediaKind, PostGroup};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("posts directory {} is unavailable: {source}", .path.display())]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Scan `dir` and group every recognized file by basename.
pub fn scan(dir: &Path) -> Result<GroupMap, ScanError> {
    scan_excluding(dir, &[])
}

/// Like [`scan`], but never treats the files in `skip` as content.
///
/// Used to keep a ledger stored inside the posts directory from being read
/// as the caption of a group.
pub fn scan_excluding(dir: &Path, skip: &[PathBuf]) -> Result<GroupMap, ScanError> {
    let entries = collect_entries(dir, skip)?;

    let mut builders: BTreeMap<String, GroupBuilder> = BTreeMap::new();
    for path in entries {
        match naming::classify(&path) {
            Ok(classified) => {
                debug!(file = %path.display(), basename = %classified.basename, role = ?classified.role, "classified");
                builders
                    .entry(classified.basename.clone())
                    .or_insert_with(|| GroupBuilder::new(classified.basename))
                    .add(path, classified.role);
            }
            Err(Unclassifiable::Ignored) => {
                debug!(file = %path.display(), "ignored");
            }
            Err(Unclassifiable::BadBasename(name)) => {
                warn!(file = %name, "skipping file whose basename can't be recorded in the ledger");
            }
        }
    }

    Ok(builders
        .into_iter()
        .map(|(basename, builder)| (basename, builder.finish()))
        .collect())
}

fn collect_entries(dir: &Path, skip: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
    let unavailable = |source| ScanError::DirectoryUnavailable {
        path: dir.to_path_buf(),
        source,
    };
    let skip: Vec<PathBuf> = skip.iter().filter_map(|p| fs::canonicalize(p).ok()).collect();

    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(unavailable)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            skip.is_empty()
                || fs::canonicalize(p)
                    .map(|c| !skip.contains(&c))
                    .unwrap_or(true)
        })
        .collect();

    entries.sort();
    Ok(entries)
}

struct GroupBuilder {
    group: PostGroup,
    caption_seen: bool,
    alt_seen: bool,
}

impl GroupBuilder {
    fn new(basename: String) -> Self {
        Self {
            group: PostGroup::new(basename),
            caption_seen: false,
            alt_seen: false,
        }
    }

    fn add(&mut self, path: PathBuf, role: Role) {
        self.group.files.push(path.clone());
        match role {
            Role::Image(index) => self.add_media(path, MediaKind::Image, index),
            Role::Video(index) => self.add_media(path, MediaKind::Video, index),
            Role::Caption => {
                if std::mem::replace(&mut self.caption_seen, true) {
                    self.group.defects.push(Defect::Ambiguous { path });
                } else {
                    self.group.caption_text = self.read_text(&path);
                }
            }
            Role::Alt => {
                if std::mem::replace(&mut self.alt_seen, true) {
                    self.group.defects.push(Defect::Ambiguous { path });
                } else {
                    self.group.alt_text = self.read_text(&path);
                }
            }
        }
    }

    fn add_media(&mut self, path: PathBuf, kind: MediaKind, index: Option<u32>) {
        let clashes = self.group.media_files.iter().any(|m| {
            m.index == index || (m.kind == kind && m.index.is_some() != index.is_some())
        });
        if clashes {
            self.group.defects.push(Defect::Ambiguous { path: path.clone() });
        }
        self.group.media_files.push(MediaFile { path, kind, index });
    }

    fn read_text(&mut self, path: &Path) -> Option<String> {
        match fs::read_to_string(path) {
            Ok(content) => {
                let trimmed = content.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(e) => {
                self.group.defects.push(Defect::UnreadableText {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    fn finish(mut self) -> PostGroup {
        self.group.media_files.sort_by(|a, b| {
            (a.index.is_some(), a.index, &a.path).cmp(&(b.index.is_some(), b.index, &b.path))
        });
        self.group.files.sort();
        self.group
    }
}
