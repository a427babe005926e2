//! One scan → select → publish → record cycle.
//!
//! ```text
//! scan ─▶ partition ─▶ ledger.load ─▶ select ─▶ assemble ─▶ publishers ─▶ ledger.record ─▶ archive
//!                                       │
//!                                       └─ NothingEligible: done, exit 0
//! ```
//!
//! The ledger is written only after every publisher succeeded, and exactly
//! once per run. A failed publish leaves it untouched.

use crate::assemble::assemble;
use crate::config::Limits;
use crate::ledger::{Ledger, LedgerError};
use crate::publish::{PublishError, Publisher};
use crate::scan::{self, ScanError};
use crate::select::{Selection, select};
use crate::types::{PostGroup, PublishReceipt};
use crate::validate::{Validated, partition};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("no publishers are enabled")]
    NoPublishers,
    #[error("publishing {basename} failed: {}", format_failures(.failures))]
    PublishFailed {
        basename: String,
        failures: Vec<PublishError>,
    },
    #[error("posted {basename} but could not archive {}: {source}", .path.display())]
    Archive {
        basename: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_failures(failures: &[PublishError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Posted {
        basename: String,
        receipts: Vec<PublishReceipt>,
    },
    NothingEligible,
}

/// Everything one run needs.
pub struct RunContext<'a, L: Ledger, R: Rng + ?Sized> {
    pub posts_dir: &'a Path,
    pub limits: &'a Limits,
    pub ledger: &'a mut L,
    /// Files never treated as content, e.g. a ledger inside the posts directory.
    pub skip: &'a [PathBuf],
    pub publishers: &'a [Box<dyn Publisher>],
    pub archive_dir: Option<&'a Path>,
    pub rng: &'a mut R,
}

/// Scan and validate without touching the ledger or publishers.
pub fn survey(posts_dir: &Path, skip: &[PathBuf], limits: &Limits) -> Result<Validated, RunError> {
    info!(dir = %posts_dir.display(), "scanning");
    let groups = scan::scan_excluding(posts_dir, skip)?;
    let validated = partition(groups, limits);
    info!(
        accepted = validated.accepted.len(),
        rejected = validated.rejected.len(),
        "validated groups"
    );
    Ok(validated)
}

pub fn run_once<L, R>(ctx: RunContext<'_, L, R>) -> Result<RunOutcome, RunError>
where
    L: Ledger,
    R: Rng + ?Sized,
{
    let validated = survey(ctx.posts_dir, ctx.skip, ctx.limits)?;
    let posted = ctx.ledger.load()?;
    info!(posted = posted.len(), "loaded ledger");

    let group = match select(&validated.accepted, &posted, ctx.rng) {
        Selection::Chosen(group) => group,
        Selection::NothingEligible => {
            info!("nothing new to post");
            return Ok(RunOutcome::NothingEligible);
        }
    };
    if ctx.publishers.is_empty() {
        return Err(RunError::NoPublishers);
    }

    let unit = assemble(group);
    info!(
        basename = %unit.basename,
        kind = %unit.kind,
        media = unit.media.len(),
        "selected"
    );

    // every publisher gets its turn even after a failure
    let mut receipts = Vec::new();
    let mut failures = Vec::new();
    for publisher in ctx.publishers {
        match publisher.publish(&unit) {
            Ok(receipt) => {
                info!(publisher = publisher.name(), post_id = ?receipt.post_id, "published");
                receipts.push(receipt);
            }
            Err(e) => {
                error!(publisher = publisher.name(), "publish failed: {e}");
                failures.push(e);
            }
        }
    }
    if !failures.is_empty() {
        return Err(RunError::PublishFailed {
            basename: unit.basename,
            failures,
        });
    }

    ctx.ledger.record(posted, &group.basename)?;
    info!(basename = %group.basename, "recorded in ledger");

    if let Some(archive_dir) = ctx.archive_dir {
        archive(group, archive_dir)?;
    }

    Ok(RunOutcome::Posted {
        basename: group.basename.clone(),
        receipts,
    })
}

/// Move every file of `group` into `archive_dir`.
fn archive(group: &PostGroup, archive_dir: &Path) -> Result<(), RunError> {
    let archive_err = |path: &Path, source| RunError::Archive {
        basename: group.basename.clone(),
        path: path.to_path_buf(),
        source,
    };
    fs::create_dir_all(archive_dir).map_err(|e| archive_err(archive_dir, e))?;

    for file in &group.files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let target = archive_dir.join(name);
        if target.exists() {
            warn!(file = %target.display(), "archive already has this file, overwriting");
        }
        fs::rename(file, &target).map_err(|e| archive_err(file, e))?;
        info!(file = %file.display(), to = %target.display(), "archived");
    }
    Ok(())
}
