//! Publishing targets.
//!
//! A [`Publisher`] receives a fully assembled [`PostUnit`] and reports
//! success or failure, plus an optional platform post id. The core never
//! looks at platform responses beyond that.
//!
//! Platform SDKs are kept out of process. A [`CommandPublisher`] runs any
//! program (a script wrapping a platform API, for instance) and writes the
//! post to its stdin as JSON:
//!
//! ```json
//! {
//!   "basename": "trip",
//!   "kind": "image",
//!   "media": ["posts/trip-1.jpg", "posts/trip-2.jpg"],
//!   "caption": "Two days in the hills",
//!   "alt_texts": ["Hills at dawn", "Hills at dawn"]
//! }
//! ```
//!
//! Exit status 0 means posted; anything printed on stdout is taken as the
//! post id. Retries, if any, belong to that program.

use crate::config::{PublisherConfig, PublisherKind};
use crate::types::{PostUnit, PublishReceipt};
use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("{publisher}: could not run {program}: {source}")]
    Spawn {
        publisher: String,
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{publisher}: could not encode post: {source}")]
    Encode {
        publisher: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{publisher}: {detail}")]
    Rejected { publisher: String, detail: String },
}

pub trait Publisher {
    /// Name used in logs and receipts.
    fn name(&self) -> &str;

    fn publish(&self, unit: &PostUnit) -> Result<PublishReceipt, PublishError>;
}

/// Hands the post to an external program.
#[derive(Debug, Clone)]
pub struct CommandPublisher {
    name: String,
    program: String,
    args: Vec<String>,
}

impl CommandPublisher {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
        }
    }
}

impl Publisher for CommandPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, unit: &PostUnit) -> Result<PublishReceipt, PublishError> {
        let payload = serde_json::to_vec(unit).map_err(|source| PublishError::Encode {
            publisher: self.name.clone(),
            source,
        })?;
        let spawn_err = |source| PublishError::Spawn {
            publisher: self.name.clone(),
            program: self.program.clone(),
            source,
        };

        debug!(publisher = %self.name, program = %self.program, "spawning");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        // stdin is fed from its own thread while stdout and stderr drain, so
        // a program that prints before reading can't stall on a full pipe
        let stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            if let Some(mut stdin) = stdin {
                scope.spawn(move || {
                    // A program that exits without reading stdin closes the
                    // pipe; its exit status decides the outcome, not the write.
                    if let Err(e) = stdin.write_all(&payload) {
                        debug!(publisher = %self.name, error = %e, "stdin closed early");
                    }
                });
            }
            child.wait_with_output()
        })
        .map_err(spawn_err)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PublishError::Rejected {
                publisher: self.name.clone(),
                detail: format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(PublishReceipt {
            publisher: self.name.clone(),
            post_id: (!stdout.is_empty()).then_some(stdout),
        })
    }
}

/// Logs the post instead of sending it.
#[derive(Debug, Clone)]
pub struct DryRunPublisher {
    name: String,
}

impl DryRunPublisher {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Publisher for DryRunPublisher {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, unit: &PostUnit) -> Result<PublishReceipt, PublishError> {
        info!(
            publisher = %self.name,
            basename = %unit.basename,
            kind = %unit.kind,
            media = unit.media.len(),
            caption_chars = unit.caption.chars().count(),
            "dry run, nothing sent"
        );
        Ok(PublishReceipt {
            publisher: self.name.clone(),
            post_id: None,
        })
    }
}

/// Build the enabled publishers, in config order.
pub fn from_config(configs: &[PublisherConfig]) -> Vec<Box<dyn Publisher>> {
    configs
        .iter()
        .filter(|c| c.enabled)
        .map(|c| -> Box<dyn Publisher> {
            match c.kind {
                PublisherKind::Command => Box::new(CommandPublisher::new(
                    &c.name,
                    c.program.clone().unwrap_or_default(),
                    c.args.clone(),
                )),
                PublisherKind::DryRun => Box::new(DryRunPublisher::new(&c.name)),
            }
        })
        .collect()
}
