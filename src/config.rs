//! Configuration module.
//!
//! Handles loading, validating, and merging `postpick.toml`. User values are
//! merged on top of stock defaults, so a config file only needs the keys it
//! wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [content]
//! posts_directory = "posts"   # Flat directory of postable files
//! ledger = "posted.txt"       # One posted basename per line
//! # archive_dir = "posts/posted"  # Move posted files here (off by default)
//!
//! [limits]
//! max_images = 4              # Images per post
//! max_image_size_mb = 8.0     # Per image, MiB
//! max_video_size_mb = 100.0   # Per video, MiB
//! caption_text_limit = 280    # Characters, for publishers without text_limit
//! alt_text_limit = 1000       # Characters
//!
//! [[publishers]]
//! name = "x"
//! kind = "command"            # "command" or "dry-run"
//! program = "post-to-x"       # Receives the post as JSON on stdin
//! args = []
//! enabled = true
//! # text_limit = 280         # Caption limit for this publisher
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration loaded from `postpick.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where content and the ledger live.
    pub content: ContentConfig,
    /// Per-post content limits used by the validator.
    pub limits: Limits,
    /// Publishing targets, attempted in order.
    pub publishers: Vec<PublisherConfig>,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.validate()?;

        let mut names = HashSet::new();
        for publisher in &self.publishers {
            if publisher.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "publishers.name must not be empty".into(),
                ));
            }
            if !names.insert(publisher.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate publisher name '{}'",
                    publisher.name
                )));
            }
            if publisher.kind == PublisherKind::Command
                && publisher.program.as_deref().is_none_or(|p| p.trim().is_empty())
            {
                return Err(ConfigError::Validation(format!(
                    "publisher '{}' has kind = \"command\" but no program",
                    publisher.name
                )));
            }
            if publisher.text_limit == Some(0) {
                return Err(ConfigError::Validation(format!(
                    "publisher '{}' has text_limit = 0",
                    publisher.name
                )));
            }
        }
        Ok(())
    }

    /// Limits the validator should apply so that every enabled publisher
    /// accepts the post.
    ///
    /// The caption limit is the smallest `text_limit` among enabled
    /// publishers, each falling back to `limits.caption_text_limit`.
    pub fn effective_limits(&self) -> Limits {
        let caption_text_limit = self
            .publishers
            .iter()
            .filter(|p| p.enabled)
            .map(|p| p.text_limit.unwrap_or(self.limits.caption_text_limit))
            .min()
            .unwrap_or(self.limits.caption_text_limit);
        Limits {
            caption_text_limit,
            ..self.limits.clone()
        }
    }
}

/// Content and ledger locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// Directory scanned for postable files (non-recursive).
    pub posts_directory: PathBuf,
    /// Ledger file of posted basenames.
    pub ledger: PathBuf,
    /// When set, files of a posted group are moved here after recording.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_dir: Option<PathBuf>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            posts_directory: PathBuf::from("posts"),
            ledger: PathBuf::from("posted.txt"),
            archive_dir: None,
        }
    }
}

/// Content limits a group must satisfy to be postable.
///
/// `caption_text_limit` is the default for publishers that don't set their
/// own `text_limit`; see [`Config::effective_limits`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    pub max_images: usize,
    pub max_image_size_mb: f64,
    pub max_video_size_mb: f64,
    pub caption_text_limit: usize,
    pub alt_text_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_images: 4,
            max_image_size_mb: 8.0,
            max_video_size_mb: 100.0,
            caption_text_limit: 280,
            alt_text_limit: 1000,
        }
    }
}

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

impl Limits {
    pub fn max_image_bytes(&self) -> u64 {
        (self.max_image_size_mb * BYTES_PER_MB) as u64
    }

    pub fn max_video_bytes(&self) -> u64 {
        (self.max_video_size_mb * BYTES_PER_MB) as u64
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_images == 0 {
            return Err(ConfigError::Validation(
                "limits.max_images must be at least 1".into(),
            ));
        }
        let positive = |mb: f64| mb.is_finite() && mb > 0.0;
        if !positive(self.max_image_size_mb) || !positive(self.max_video_size_mb) {
            return Err(ConfigError::Validation(
                "limits.max_image_size_mb and limits.max_video_size_mb must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// How a publisher hands a post off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublisherKind {
    /// Run an external program with the post as JSON on stdin.
    #[default]
    Command,
    /// Log the post and report success without sending anything.
    DryRun,
}

/// One `[[publishers]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublisherConfig {
    pub name: String,
    #[serde(default)]
    pub kind: PublisherKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Caption limit in characters; `limits.caption_text_limit` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_limit: Option<usize>,
}

fn default_enabled() -> bool {
    true
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default())
        .unwrap_or_else(|_| toml::Value::Table(toml::map::Map::new()))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (including arrays) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it's absent.
///
/// Relative content paths are resolved against the config file's directory,
/// so a scheduled run works regardless of its working directory.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    let mut config = resolve_config(base, overlay)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        config.content.posts_directory = dir.join(&config.content.posts_directory);
        config.content.ledger = dir.join(&config.content.ledger);
        config.content.archive_dir = config.content.archive_dir.map(|a| dir.join(a));
    }
    Ok(config)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# postpick configuration
# ======================
# All settings are optional. Values shown below are the defaults.
# Relative paths are resolved against the directory of this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Content
# ---------------------------------------------------------------------------
[content]
# Flat directory of postable files. Files sharing a basename form one post:
#   trip-1.jpg, trip-2.jpg   numbered images, posted in order
#   trip.txt                 caption
#   trip-alt.txt             alt text for the images
posts_directory = "posts"

# Ledger of posted basenames, one per line. Delete a line to allow a repost.
ledger = "posted.txt"

# Move the files of each posted group into this directory.
# archive_dir = "posts/posted"

# ---------------------------------------------------------------------------
# Limits (a group breaking any of these is never posted)
# ---------------------------------------------------------------------------
[limits]
max_images = 4
max_image_size_mb = 8.0
max_video_size_mb = 100.0

# Characters. caption_text_limit applies to publishers without their own
# text_limit; a caption must fit the smallest limit of all enabled publishers.
caption_text_limit = 280
alt_text_limit = 1000

# ---------------------------------------------------------------------------
# Publishers (every enabled publisher must succeed for a post to count)
# ---------------------------------------------------------------------------
# [[publishers]]
# name = "x"
# kind = "command"        # receives the post as JSON on stdin;
# program = "post-to-x"   # exit 0 = success, stdout = post id
# args = []
# enabled = true
# text_limit = 280        # caption limit for this publisher only
#
# [[publishers]]
# name = "preview"
# kind = "dry-run"        # logs the post, sends nothing
"##
}
