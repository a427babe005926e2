use clap::{Parser, Subcommand};
use postpick::ledger::{FileLedger, Ledger, RunLock};
use postpick::run::{self, RunContext};
use postpick::{config, output, publish};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "postpick")]
#[command(about = "Post one random, never-posted item from a content directory")]
#[command(long_about = "\
Post one random, never-posted item from a content directory

Meant to be run on a schedule (cron, systemd timer). Each run picks one
group of files that hasn't been posted yet, hands it to the configured
publishers, and records it in the ledger.

Content structure:

  posts/
  ├── trip-1.jpg          # Numbered images, posted in order
  ├── trip-2.jpg
  ├── trip.txt            # Caption
  ├── trip-alt.txt        # Alt text for every image in the post
  ├── clip.mp4            # A single video
  ├── clip.txt
  └── thought.txt         # Caption alone is a text post

Groups that break the rules (mixed images and video, gaps in numbering,
captions over the limit) are skipped and reported by 'postpick check'.

Log verbosity follows RUST_LOG (default: info). Logs go to stderr, and
also to --log-file when given.

Run 'postpick gen-config' to generate a documented postpick.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "postpick.toml", global = true)]
    config: PathBuf,

    /// Seed the random choice, for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Also append logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Post one eligible group (the default)
    Post,
    /// Report accepted, rejected and already-posted groups without posting
    Check,
    /// Print a stock postpick.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref());

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command.unwrap_or(Command::Post) {
        Command::Post => {
            let config = config::load_config(&cli.config)?;
            let limits = config.effective_limits();
            let content = &config.content;
            let _lock = RunLock::acquire(&content.ledger)?;
            let mut ledger = FileLedger::new(&content.ledger);
            let publishers = publish::from_config(&config.publishers);
            let mut rng = match cli.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let outcome = run::run_once(RunContext {
                posts_dir: &content.posts_directory,
                limits: &limits,
                ledger: &mut ledger,
                skip: std::slice::from_ref(&content.ledger),
                publishers: &publishers,
                archive_dir: content.archive_dir.as_deref(),
                rng: &mut rng,
            })?;
            output::print_run_outcome(&outcome);
        }
        Command::Check => {
            let config = config::load_config(&cli.config)?;
            let content = &config.content;
            let validated = run::survey(
                &content.posts_directory,
                std::slice::from_ref(&content.ledger),
                &config.effective_limits(),
            )?;
            let posted = FileLedger::new(&content.ledger).load()?;
            output::print_check_report(&validated, &posted);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Structured logs on stderr, and in `log_file` when set, filtered by
/// `RUST_LOG`. The returned guard flushes the file on drop.
fn init_tracing(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut open_error = None;
    let (file_layer, guard) = match log_file.map(file_appender) {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        Some(Err(e)) => {
            open_error = Some(e);
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();

    if let Some(e) = open_error {
        tracing::warn!("log file unavailable, logging to stderr only: {e}");
    }
    guard
}

/// Appender that keeps adding to one file, never rotating.
fn file_appender(path: &Path) -> Result<RollingFileAppender, InitError> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "postpick.log".to_string());
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
}
