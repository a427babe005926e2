//! Group validation against content limits.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! | Code | Condition |
//! |------|-----------|
//! | `mixed-media` | images and video in one group |
//! | `too-many-media` | more images than `max_images`, or more than one video |
//! | `oversized-media` | a file over its kind's size limit |
//! | `unreadable-media` | file metadata can't be read |
//! | `ambiguous-media` | two files compete for one slot |
//! | `gap-in-sequence` | numbered media not exactly `1..=n` |
//! | `unreadable-text` | caption or alt file isn't UTF-8 text |
//! | `caption-too-long` | caption over `caption_text_limit` characters |
//! | `alt-too-long` | alt text over `alt_text_limit` characters |
//! | `empty-group` | no media and no caption |
//!
//! Captions are never truncated here. Only file metadata is read, never
//! file contents, so the result is deterministic for a filesystem snapshot.

use crate::config::Limits;
use crate::types::{Defect, GroupMap, MediaKind, PostGroup};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Why a group can't be posted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("mixed-media: {images} image(s) and {videos} video(s) in one post")]
    MixedMedia { images: usize, videos: usize },
    #[error("too-many-media: {count} {kind} file(s), at most {max} allowed")]
    TooManyMedia {
        kind: MediaKind,
        count: usize,
        max: usize,
    },
    #[error("oversized-media: {} is {size} bytes, limit is {limit}", .path.display())]
    OversizedMedia { path: PathBuf, size: u64, limit: u64 },
    #[error("unreadable-media: {}: {reason}", .path.display())]
    UnreadableMedia { path: PathBuf, reason: String },
    #[error("ambiguous-media: {} competes with another file for the same place", .path.display())]
    Ambiguous { path: PathBuf },
    #[error("gap-in-sequence: expected indices 1..={expected}, found {found:?}")]
    GapInSequence { expected: usize, found: Vec<u32> },
    #[error("unreadable-text: {}: {reason}", .path.display())]
    UnreadableText { path: PathBuf, reason: String },
    #[error("caption-too-long: {len} characters, limit is {max}")]
    CaptionTooLong { len: usize, max: usize },
    #[error("alt-too-long: {len} characters, limit is {max}")]
    AltTooLong { len: usize, max: usize },
    #[error("empty-group: no media and no caption")]
    EmptyGroup,
}

impl Rejection {
    /// Stable kebab-case code, suitable for logs and reports.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::MixedMedia { .. } => "mixed-media",
            Rejection::TooManyMedia { .. } => "too-many-media",
            Rejection::OversizedMedia { .. } => "oversized-media",
            Rejection::UnreadableMedia { .. } => "unreadable-media",
            Rejection::Ambiguous { .. } => "ambiguous-media",
            Rejection::GapInSequence { .. } => "gap-in-sequence",
            Rejection::UnreadableText { .. } => "unreadable-text",
            Rejection::CaptionTooLong { .. } => "caption-too-long",
            Rejection::AltTooLong { .. } => "alt-too-long",
            Rejection::EmptyGroup => "empty-group",
        }
    }
}

/// Check one group against `limits`.
pub fn validate(group: &PostGroup, limits: &Limits) -> Result<(), Rejection> {
    let images = group.count_of(MediaKind::Image);
    let videos = group.count_of(MediaKind::Video);

    if images > 0 && videos > 0 {
        return Err(Rejection::MixedMedia { images, videos });
    }
    if images > limits.max_images {
        return Err(Rejection::TooManyMedia {
            kind: MediaKind::Image,
            count: images,
            max: limits.max_images,
        });
    }
    if videos > 1 {
        return Err(Rejection::TooManyMedia {
            kind: MediaKind::Video,
            count: videos,
            max: 1,
        });
    }

    for media in &group.media_files {
        let limit = match media.kind {
            MediaKind::Video => limits.max_video_bytes(),
            _ => limits.max_image_bytes(),
        };
        let size = fs::metadata(&media.path)
            .map_err(|e| Rejection::UnreadableMedia {
                path: media.path.clone(),
                reason: e.to_string(),
            })?
            .len();
        if size > limit {
            return Err(Rejection::OversizedMedia {
                path: media.path.clone(),
                size,
                limit,
            });
        }
    }

    if let Some(Defect::Ambiguous { path }) = group
        .defects
        .iter()
        .find(|d| matches!(d, Defect::Ambiguous { .. }))
    {
        return Err(Rejection::Ambiguous { path: path.clone() });
    }

    if group.media_files.len() > 1 {
        let found: Vec<u32> = group.media_files.iter().filter_map(|m| m.index).collect();
        let contiguous = found
            .iter()
            .enumerate()
            .all(|(pos, &index)| index as usize == pos + 1);
        if found.len() != group.media_files.len() || !contiguous {
            return Err(Rejection::GapInSequence {
                expected: group.media_files.len(),
                found,
            });
        }
    }

    if let Some(Defect::UnreadableText { path, reason }) = group
        .defects
        .iter()
        .find(|d| matches!(d, Defect::UnreadableText { .. }))
    {
        return Err(Rejection::UnreadableText {
            path: path.clone(),
            reason: reason.clone(),
        });
    }

    if let Some(caption) = &group.caption_text {
        let len = caption.chars().count();
        if len > limits.caption_text_limit {
            return Err(Rejection::CaptionTooLong {
                len,
                max: limits.caption_text_limit,
            });
        }
    }
    if let Some(alt) = &group.alt_text {
        let len = alt.chars().count();
        if len > limits.alt_text_limit {
            return Err(Rejection::AltTooLong {
                len,
                max: limits.alt_text_limit,
            });
        }
    }

    if group.media_files.is_empty() && group.caption_text.is_none() {
        return Err(Rejection::EmptyGroup);
    }
    Ok(())
}

/// A group that failed validation, with the first reason found.
#[derive(Debug, Clone)]
pub struct RejectedGroup {
    pub group: PostGroup,
    pub rejection: Rejection,
}

/// Groups split by validation outcome.
#[derive(Debug, Default)]
pub struct Validated {
    pub accepted: GroupMap,
    pub rejected: BTreeMap<String, RejectedGroup>,
}

/// Validate every group; rejections are logged and set aside.
pub fn partition(groups: GroupMap, limits: &Limits) -> Validated {
    let mut validated = Validated::default();
    for (basename, group) in groups {
        match validate(&group, limits) {
            Ok(()) => {
                validated.accepted.insert(basename, group);
            }
            Err(rejection) => {
                warn!(group = %basename, code = rejection.code(), "rejected: {rejection}");
                validated
                    .rejected
                    .insert(basename, RejectedGroup { group, rejection });
            }
        }
    }
    validated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::scan;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn check(files: &[(&str, &str)]) -> Result<(), Rejection> {
        check_with(files, &Limits::default())
    }

    fn check_with(files: &[(&str, &str)], limits: &Limits) -> Result<(), Rejection> {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), files);
        let groups = scan(tmp.path()).unwrap();
        assert_eq!(groups.len(), 1, "fixture must form one group");
        validate(groups.values().next().unwrap(), limits)
    }

    fn code(result: Result<(), Rejection>) -> &'static str {
        result.err().map(|r| r.code()).unwrap_or("accepted")
    }

    #[test]
    fn numbered_images_with_caption_accepted() {
        assert_eq!(
            check(&[("trip-1.jpg", "a"), ("trip-2.jpg", "b"), ("trip.txt", "Hi")]),
            Ok(())
        );
    }

    #[test]
    fn single_image_accepted() {
        assert_eq!(check(&[("solo.png", "x")]), Ok(()));
    }

    #[test]
    fn single_numbered_image_accepted() {
        assert_eq!(check(&[("solo-3.png", "x")]), Ok(()));
    }

    #[test]
    fn caption_only_accepted() {
        assert_eq!(check(&[("thought.txt", "words")]), Ok(()));
    }

    #[test]
    fn mixed_media_rejected() {
        let result = check(&[("a-1.jpg", "x"), ("a-2.mp4", "y")]);
        assert_eq!(result, Err(Rejection::MixedMedia { images: 1, videos: 1 }));
    }

    #[test]
    fn two_videos_rejected() {
        let result = check(&[("clip.mp4", "x"), ("clip-2.mp4", "y")]);
        assert_eq!(
            result,
            Err(Rejection::TooManyMedia {
                kind: MediaKind::Video,
                count: 2,
                max: 1
            })
        );
    }

    #[test]
    fn too_many_images_rejected() {
        let limits = Limits {
            max_images: 2,
            ..Limits::default()
        };
        let result = check_with(&[("a-1.jpg", "x"), ("a-2.jpg", "x"), ("a-3.jpg", "x")], &limits);
        assert_eq!(code(result), "too-many-media");
    }

    #[test]
    fn oversized_image_rejected() {
        let tmp = TempDir::new().unwrap();
        write_sized(tmp.path(), "big.jpg", 2 * 1024 * 1024 + 1);
        let limits = Limits {
            max_image_size_mb: 2.0,
            ..Limits::default()
        };
        let groups = scan(tmp.path()).unwrap();
        let result = validate(find_group(&groups, "big"), &limits);
        assert!(matches!(
            result,
            Err(Rejection::OversizedMedia { size, limit, .. }) if size == limit + 1
        ));
    }

    #[test]
    fn image_exactly_at_limit_accepted() {
        let tmp = TempDir::new().unwrap();
        write_sized(tmp.path(), "edge.jpg", 1024 * 1024);
        let limits = Limits {
            max_image_size_mb: 1.0,
            ..Limits::default()
        };
        let groups = scan(tmp.path()).unwrap();
        assert_eq!(validate(find_group(&groups, "edge"), &limits), Ok(()));
    }

    #[test]
    fn video_uses_video_limit() {
        let tmp = TempDir::new().unwrap();
        write_sized(tmp.path(), "clip.mp4", 3 * 1024 * 1024);
        let limits = Limits {
            max_image_size_mb: 1.0,
            max_video_size_mb: 4.0,
            ..Limits::default()
        };
        let groups = scan(tmp.path()).unwrap();
        assert_eq!(validate(find_group(&groups, "clip"), &limits), Ok(()));
    }

    #[test]
    fn missing_file_is_unreadable_media() {
        let tmp = TempDir::new().unwrap();
        write_files(tmp.path(), &[("gone.jpg", "x")]);
        let groups = scan(tmp.path()).unwrap();
        std::fs::remove_file(tmp.path().join("gone.jpg")).unwrap();
        assert_eq!(
            code(validate(find_group(&groups, "gone"), &Limits::default())),
            "unreadable-media"
        );
    }

    #[test]
    fn unnumbered_plus_numbered_image_ambiguous() {
        assert_eq!(
            code(check(&[("a.jpg", "x"), ("a-1.jpg", "y")])),
            "ambiguous-media"
        );
    }

    #[test]
    fn gap_in_sequence_rejected() {
        let result = check(&[("a-1.jpg", "x"), ("a-3.jpg", "y")]);
        assert_eq!(
            result,
            Err(Rejection::GapInSequence {
                expected: 2,
                found: vec![1, 3]
            })
        );
    }

    #[test]
    fn sequence_must_start_at_one() {
        assert_eq!(
            code(check(&[("a-2.jpg", "x"), ("a-3.jpg", "y")])),
            "gap-in-sequence"
        );
    }

    #[test]
    fn caption_too_long_rejected() {
        let caption = "é".repeat(281);
        let result = check(&[("a.jpg", "x"), ("a.txt", caption.as_str())]);
        assert_eq!(result, Err(Rejection::CaptionTooLong { len: 281, max: 280 }));
    }

    #[test]
    fn caption_limit_counts_characters_not_bytes() {
        let caption = "é".repeat(280);
        assert_eq!(check(&[("a.jpg", "x"), ("a.txt", caption.as_str())]), Ok(()));
    }

    #[test]
    fn alt_too_long_rejected() {
        let alt = "a".repeat(1001);
        assert_eq!(
            code(check(&[("a.jpg", "x"), ("a-alt.txt", alt.as_str())])),
            "alt-too-long"
        );
    }

    #[test]
    fn alt_only_group_is_empty() {
        assert_eq!(check(&[("a-alt.txt", "just alt")]), Err(Rejection::EmptyGroup));
    }

    #[test]
    fn mixed_checked_before_count() {
        let limits = Limits {
            max_images: 1,
            ..Limits::default()
        };
        let result = check_with(&[("a-1.jpg", "x"), ("a-2.jpg", "x"), ("a-3.mov", "x")], &limits);
        assert_eq!(code(result), "mixed-media");
    }

    #[test]
    fn partition_splits_groups() {
        let tmp = TempDir::new().unwrap();
        write_files(
            tmp.path(),
            &[("good.jpg", "x"), ("clip.mp4", "x"), ("clip-2.mp4", "x")],
        );
        let validated = partition(scan(tmp.path()).unwrap(), &Limits::default());
        assert_eq!(basenames(&validated.accepted), vec!["good"]);
        assert_eq!(validated.rejected["clip"].rejection.code(), "too-many-media");
    }

    #[test]
    fn rejection_display_starts_with_code() {
        let rejection = Rejection::CaptionTooLong { len: 300, max: 280 };
        assert!(rejection.to_string().starts_with(rejection.code()));
    }
}
