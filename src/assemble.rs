//! Turn an accepted [`PostGroup`] into a [`PostUnit`].
//!
//! Pure: text was already read by the grouper.
//!
//! Alt text exists once per group, so every image slot gets the same string.
//! Video slots get an empty string.

use crate::types::{MediaKind, PostGroup, PostUnit};

pub fn assemble(group: &PostGroup) -> PostUnit {
    let kind = group.media_kind().unwrap_or(MediaKind::Text);
    let media: Vec<_> = group.media_files.iter().map(|m| m.path.clone()).collect();

    let alt = match kind {
        MediaKind::Image => group.alt_text.clone().unwrap_or_default(),
        MediaKind::Video | MediaKind::Text => String::new(),
    };

    PostUnit {
        basename: group.basename.clone(),
        kind,
        alt_texts: vec![alt; media.len()],
        media,
        caption: group.caption_text.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MediaFile;
    use std::path::PathBuf;

    fn group(files: &[(&str, MediaKind, Option<u32>)]) -> PostGroup {
        let mut g = PostGroup::new("g");
        for (name, kind, index) in files {
            g.media_files.push(MediaFile {
                path: PathBuf::from(name),
                kind: *kind,
                index: *index,
            });
        }
        g
    }

    #[test]
    fn copies_ordered_media_and_caption() {
        let mut g = group(&[
            ("g-1.jpg", MediaKind::Image, Some(1)),
            ("g-2.jpg", MediaKind::Image, Some(2)),
        ]);
        g.caption_text = Some("Hello".into());

        let unit = assemble(&g);
        assert_eq!(unit.basename, "g");
        assert_eq!(unit.kind, MediaKind::Image);
        assert_eq!(
            unit.media,
            vec![PathBuf::from("g-1.jpg"), PathBuf::from("g-2.jpg")]
        );
        assert_eq!(unit.caption, "Hello");
        assert_eq!(unit.alt_texts, vec!["", ""]);
    }

    #[test]
    fn alt_text_repeated_for_every_image() {
        let mut g = group(&[
            ("g-1.jpg", MediaKind::Image, Some(1)),
            ("g-2.jpg", MediaKind::Image, Some(2)),
            ("g-3.jpg", MediaKind::Image, Some(3)),
        ]);
        g.alt_text = Some("A dog".into());

        let unit = assemble(&g);
        assert_eq!(unit.alt_texts, vec!["A dog"; 3]);
    }

    #[test]
    fn video_slot_has_no_alt_text() {
        let mut g = group(&[("g.mp4", MediaKind::Video, None)]);
        g.alt_text = Some("ignored".into());

        let unit = assemble(&g);
        assert_eq!(unit.kind, MediaKind::Video);
        assert_eq!(unit.alt_texts, vec![""]);
    }

    #[test]
    fn caption_only_post() {
        let mut g = PostGroup::new("words");
        g.caption_text = Some("Just text".into());

        let unit = assemble(&g);
        assert_eq!(unit.kind, MediaKind::Text);
        assert!(unit.media.is_empty());
        assert!(unit.alt_texts.is_empty());
    }

    #[test]
    fn missing_caption_is_empty_string() {
        let unit = assemble(&group(&[("g.png", MediaKind::Image, None)]));
        assert_eq!(unit.caption, "");
    }
}
