//! CLI output formatting.
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure. Diagnostics go through `tracing` on stderr; only
//! these reports use stdout.
//!
//! # Check
//!
//! ```text
//! Accepted
//! 001 solo (1 image) [posted]
//!     Source: solo.png
//! 002 trip (2 images, caption, alt text)
//!     Source: trip-1.jpg, trip-2.jpg, trip-alt.txt, trip.txt
//!
//! Rejected
//! 001 clip
//!     Source: clip-2.mp4, clip.mp4
//!     Reason: too-many-media: 2 video file(s), at most 1 allowed
//!
//! Eligible: 1 of 2 accepted (1 already posted, 1 rejected)
//! ```
//!
//! # Post
//!
//! ```text
//! Posted trip
//!     x: 1790123456789
//!     preview
//! ```

use crate::run::RunOutcome;
use crate::types::{MediaKind, PostGroup, PostedSet};
use crate::validate::Validated;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Short summary of what a group carries, e.g. `2 images, caption`.
fn group_summary(group: &PostGroup) -> String {
    let mut parts = Vec::new();
    match group.media_kind() {
        Some(MediaKind::Image) => parts.push(plural(group.media_files.len(), "image", "images")),
        Some(MediaKind::Video) => parts.push(plural(group.media_files.len(), "video", "videos")),
        Some(MediaKind::Text) => {}
        None => parts.push(format!(
            "{}, {}",
            plural(group.count_of(MediaKind::Image), "image", "images"),
            plural(group.count_of(MediaKind::Video), "video", "videos")
        )),
    }
    if group.caption_text.is_some() {
        parts.push("caption".to_string());
    }
    if group.alt_text.is_some() {
        parts.push("alt text".to_string());
    }
    parts.join(", ")
}

fn source_line(group: &PostGroup) -> String {
    let names: Vec<String> = group
        .files
        .iter()
        .filter_map(|f| f.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect();
    format!("{}Source: {}", indent(1), names.join(", "))
}

/// Inventory of accepted and rejected groups against the ledger.
pub fn format_check_report(validated: &Validated, posted: &PostedSet) -> Vec<String> {
    let mut lines = Vec::new();

    if !validated.accepted.is_empty() {
        lines.push("Accepted".to_string());
        for (i, (basename, group)) in validated.accepted.iter().enumerate() {
            let summary = group_summary(group);
            let mut header = if summary.is_empty() {
                format!("{} {}", format_index(i + 1), basename)
            } else {
                format!("{} {} ({})", format_index(i + 1), basename, summary)
            };
            if posted.contains(basename) {
                header.push_str(" [posted]");
            }
            lines.push(header);
            lines.push(source_line(group));
        }
    }

    if !validated.rejected.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Rejected".to_string());
        for (i, (basename, rejected)) in validated.rejected.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), basename));
            lines.push(source_line(&rejected.group));
            lines.push(format!("{}Reason: {}", indent(1), rejected.rejection));
        }
    }

    let already = validated
        .accepted
        .keys()
        .filter(|b| posted.contains(b.as_str()))
        .count();
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Eligible: {} of {} accepted ({} already posted, {} rejected)",
        validated.accepted.len() - already,
        validated.accepted.len(),
        already,
        validated.rejected.len()
    ));
    lines
}

pub fn print_check_report(validated: &Validated, posted: &PostedSet) {
    for line in format_check_report(validated, posted) {
        println!("{}", line);
    }
}

pub fn format_run_outcome(outcome: &RunOutcome) -> Vec<String> {
    match outcome {
        RunOutcome::NothingEligible => vec!["Nothing new to post".to_string()],
        RunOutcome::Posted { basename, receipts } => {
            let mut lines = vec![format!("Posted {basename}")];
            for receipt in receipts {
                lines.push(match &receipt.post_id {
                    Some(id) => format!("{}{}: {}", indent(1), receipt.publisher, id),
                    None => format!("{}{}", indent(1), receipt.publisher),
                });
            }
            lines
        }
    }
}

pub fn print_run_outcome(outcome: &RunOutcome) {
    for line in format_run_outcome(outcome) {
        println!("{}", line);
    }
}
