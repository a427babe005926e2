//! Ledger of posted basenames.
//!
//! # Design
//!
//! The ledger is a plain UTF-8 text file, one basename per line, no header.
//! It is only ever appended to. A run loads it fully into a [`PostedSet`]
//! snapshot, and after a successful publish appends exactly one line and
//! syncs it to disk before returning. A crash between publish and append can
//! cause one repost, never a lost entry.
//!
//! State is passed explicitly: [`Ledger::record`] takes the current snapshot
//! and returns the updated one. [`MemoryLedger`] implements the same contract
//! without touching the filesystem.
//!
//! ## Storage
//!
//! - Absent file → empty set (first run).
//! - Lines are trimmed; blank lines are skipped. Duplicate lines are harmless.
//! - Delete a line to make a group eligible again. A file left without a
//!   final newline by such an edit gets one before the next entry.
//!
//! ## Overlapping runs
//!
//! Two scheduled runs overlapping could both see a group as unposted. The
//! [`RunLock`] is an exclusive advisory lock on `<ledger>.lock`, held by a run
//! for its whole load → publish → record cycle. A second run fails fast with
//! [`LedgerError::Busy`] instead of waiting.

use crate::types::PostedSet;
use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("ledger {} is unavailable: {source}", .path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("basename {0:?} can't be stored as a single ledger line")]
    InvalidEntry(String),
    #[error("another run holds {}", .0.display())]
    Busy(PathBuf),
}

/// Load-then-append store of posted basenames.
pub trait Ledger {
    /// Snapshot of every recorded basename.
    fn load(&self) -> Result<PostedSet, LedgerError>;

    /// Durably record `basename`, returning `posted` with it added.
    fn record(&mut self, posted: PostedSet, basename: &str) -> Result<PostedSet, LedgerError>;
}

fn check_entry(basename: &str) -> Result<(), LedgerError> {
    if basename.trim().is_empty() || basename.contains(['\n', '\r']) {
        return Err(LedgerError::InvalidEntry(basename.to_string()));
    }
    Ok(())
}

fn parse_lines(content: &str) -> PostedSet {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when the file is non-empty and its last byte isn't `\n`.
fn ends_mid_line(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Ledger backed by a text file.
#[derive(Debug, Clone)]
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, source: io::Error) -> LedgerError {
        LedgerError::StorageUnavailable {
            path: self.path.clone(),
            source,
        }
    }
}

impl Ledger for FileLedger {
    fn load(&self) -> Result<PostedSet, LedgerError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(parse_lines(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(PostedSet::new()),
            Err(e) => Err(self.unavailable(e)),
        }
    }

    fn record(&mut self, mut posted: PostedSet, basename: &str) -> Result<PostedSet, LedgerError> {
        check_entry(basename)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.unavailable(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.unavailable(e))?;
        // a hand-edited file may end without a newline
        let entry = if ends_mid_line(&mut file).map_err(|e| self.unavailable(e))? {
            format!("\n{basename}\n")
        } else {
            format!("{basename}\n")
        };
        file.write_all(entry.as_bytes()).map_err(|e| self.unavailable(e))?;
        file.sync_all().map_err(|e| self.unavailable(e))?;
        debug!(ledger = %self.path.display(), %basename, "recorded");

        posted.insert(basename.to_string());
        Ok(posted)
    }
}

/// In-memory ledger with the same contract as [`FileLedger`].
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    lines: Vec<String>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously recorded basenames.
    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// Every line ever appended, in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Ledger for MemoryLedger {
    fn load(&self) -> Result<PostedSet, LedgerError> {
        Ok(parse_lines(&self.lines.join("\n")))
    }

    fn record(&mut self, mut posted: PostedSet, basename: &str) -> Result<PostedSet, LedgerError> {
        check_entry(basename)?;
        self.lines.push(basename.to_string());
        posted.insert(basename.to_string());
        Ok(posted)
    }
}

/// Exclusive advisory lock guarding one run. Released on drop.
#[derive(Debug)]
pub struct RunLock {
    _file: File,
    path: PathBuf,
}

impl RunLock {
    /// Lock `<ledger>.lock`, failing with [`LedgerError::Busy`] if another
    /// run already holds it.
    pub fn acquire(ledger: &Path) -> Result<Self, LedgerError> {
        let mut name = ledger.as_os_str().to_owned();
        name.push(".lock");
        let path = PathBuf::from(name);
        let unavailable = |source| LedgerError::StorageUnavailable {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(unavailable)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(unavailable)?;
        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Err(LedgerError::Busy(path)),
            Err(TryLockError::Error(e)) => return Err(unavailable(e)),
        }
        debug!(lock = %path.display(), "acquired run lock");
        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
