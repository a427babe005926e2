//! # postpick
//!
//! Posts one random, not-yet-posted item from a flat content directory each
//! time it runs. Your filesystem is the queue: files sharing a basename form
//! a post, and a plain-text ledger remembers what already went out.
//!
//! # Architecture: One Cycle Per Run
//!
//! Each invocation is a single pass with no daemon and no state besides the
//! ledger:
//!
//! ```text
//! 1. Scan       posts/      →  groups         (files → PostGroup by basename)
//! 2. Validate   groups      →  accepted       (limits, numbering, media mix)
//! 3. Select     accepted    →  one group      (uniform random among unposted)
//! 4. Assemble   group       →  PostUnit       (ordered media, caption, alt text)
//! 5. Publish    PostUnit    →  receipts       (every enabled publisher)
//! 6. Record     basename    →  posted.txt     (only after all publishers succeed)
//! ```
//!
//! Scheduling is left to cron or a systemd timer.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | Filename convention: basename, `-N` index, `-alt` marker, role by extension |
//! | [`scan`] | Reads the posts directory and builds groups by basename |
//! | [`validate`] | Rejects groups that can't be posted, with a reason code |
//! | [`select`] | Uniform random choice among accepted, unposted groups |
//! | [`assemble`] | Turns a group into a platform-agnostic [`types::PostUnit`] |
//! | [`publish`] | [`publish::Publisher`] trait, external-command and dry-run publishers |
//! | [`ledger`] | Append-only record of posted basenames, plus the run lock |
//! | [`run`] | Wires the stages into one scan → publish → record cycle |
//! | [`config`] | `postpick.toml` loading, stock defaults, validation |
//! | [`types`] | Value types shared between stages |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Ledger Written Last
//!
//! A basename is appended to the ledger only after every publisher reported
//! success, and the append is flushed to disk before the run ends. A crash
//! between publishing and recording can cause one repost; it can never cause
//! a post to be silently lost from the queue.
//!
//! ## Publishers Out Of Process
//!
//! Platform APIs change often and need credentials. The core only knows the
//! [`publish::Publisher`] trait; the stock implementation pipes the post as
//! JSON into any program you configure. Swapping platforms means swapping a
//! script, not rebuilding.
//!
//! ## Filenames Carry Everything
//!
//! No database, no front-matter, no sidecar manifest. Order comes from `-1`,
//! `-2` suffixes, captions from a `.txt` with the same basename, alt text from
//! `-alt.txt`. Deleting a line from the ledger makes a post eligible again.

pub mod assemble;
pub mod config;
pub mod ledger;
pub mod naming;
pub mod output;
pub mod publish;
pub mod run;
pub mod scan;
pub mod select;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
