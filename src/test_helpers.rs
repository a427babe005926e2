//! Shared test utilities for the postpick test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_files(tmp.path(), &[("trip-1.jpg", "x"), ("trip.txt", "Hello")]);
//! let groups = scan(tmp.path()).unwrap();
//!
//! let trip = find_group(&groups, "trip");
//! assert_eq!(media_names(trip), vec!["trip-1.jpg"]);
//! ```

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::publish::{PublishError, Publisher};
use crate::types::{GroupMap, PostGroup, PostUnit, PublishReceipt};

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `(name, contents)` pairs into `dir`.
pub fn write_files(dir: &Path, files: &[(&str, &str)]) {
    for (name, contents) in files {
        std::fs::write(dir.join(name), contents).unwrap();
    }
}

/// Write a file of exactly `bytes` bytes.
pub fn write_sized(dir: &Path, name: &str, bytes: usize) {
    std::fs::write(dir.join(name), vec![0u8; bytes]).unwrap();
}

// =========================================================================
// Group lookups (panic with a clear message on miss)
// =========================================================================

/// Find a group by basename. Panics if not found.
pub fn find_group<'a>(groups: &'a GroupMap, basename: &str) -> &'a PostGroup {
    groups.get(basename).unwrap_or_else(|| {
        let names: Vec<&str> = groups.keys().map(String::as_str).collect();
        panic!("group '{basename}' not found. Available: {names:?}")
    })
}

/// All basenames in sorted order.
pub fn basenames(groups: &GroupMap) -> Vec<&str> {
    groups.keys().map(String::as_str).collect()
}

/// File names of a group's media, in post order.
pub fn media_names(group: &PostGroup) -> Vec<String> {
    group
        .media_files
        .iter()
        .map(|m| m.path.file_name().unwrap().to_string_lossy().to_string())
        .collect()
}

// =========================================================================
// Publishers
// =========================================================================

/// Units handed to a [`RecordingPublisher`], shared with the test.
pub type PublishLog = Rc<RefCell<Vec<PostUnit>>>;

/// Publisher that remembers every unit it was handed.
pub struct RecordingPublisher {
    name: String,
    fail: bool,
    seen: PublishLog,
}

impl RecordingPublisher {
    pub fn ok(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fail: false,
            seen: PublishLog::default(),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            fail: true,
            ..Self::ok(name)
        }
    }

    /// Handle to the units seen so far; stays valid after the publisher is boxed.
    pub fn log(&self) -> PublishLog {
        Rc::clone(&self.seen)
    }
}

impl Publisher for RecordingPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, unit: &PostUnit) -> Result<PublishReceipt, PublishError> {
        self.seen.borrow_mut().push(unit.clone());
        if self.fail {
            return Err(PublishError::Rejected {
                publisher: self.name.clone(),
                detail: "refused by test".into(),
            });
        }
        Ok(PublishReceipt {
            publisher: self.name.clone(),
            post_id: Some(format!("{}-{}", self.name, unit.basename)),
        })
    }
}
