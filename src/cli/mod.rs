//! CLI mode for vfetch - command-line interface for batch downloads.

mod progress;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::{AppConfig, Batch, BatchSummary, Error, YtDlp};

pub use progress::{CliProgress, make_progress_bar, make_total_progress_bar, print_summary};

/// Exit status used when the batch is interrupted.
const EXIT_INTERRUPTED: u8 = 130;

/// Batch-download YouTube videos with yt-dlp
#[derive(Parser, Debug)]
#[command(name = "vfetch", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file [default: <config dir>/vfetch/config.toml]
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download videos listed in a file, one id or URL per line
    Download {
        /// Path to a text file containing video ids or URLs
        #[arg(short, long, value_name = "PATH")]
        ids: PathBuf,

        /// Directory to save the downloaded videos [default: outputs/default]
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// Download the latest uploads of a channel
    Channel {
        /// Channel URL (e.g. https://www.youtube.com/@ChannelName)
        #[arg(short, long, value_name = "URL")]
        url: String,

        /// Directory to save the downloaded videos [default: outputs/default]
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Only the last N videos; all videos if omitted
        #[arg(short = 'n', long, value_name = "N")]
        limit: Option<NonZeroUsize>,
    },
}

impl Command {
    /// The `--out` value, if given.
    #[must_use]
    pub const fn out(&self) -> Option<&PathBuf> {
        match self {
            Self::Download { out, .. } | Self::Channel { out, .. } => out.as_ref(),
        }
    }
}

/// Sets up `env_logger`; `RUST_LOG` overrides the level picked here.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_target(false)
        .init();
}

/// Cancels `token` on Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, stopping after cleanup");
            token.cancel();
        }
    });
}

/// Parses arguments and runs the requested batch.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = execute(cli).await;
    match &outcome {
        Err(Error::Cancelled) => {
            log::error!("Cancelled; partially downloaded files were left in place");
        }
        Err(e) => log::error!("{e}"),
        Ok(_) => {}
    }
    exit_code(&outcome)
}

/// Maps a batch outcome to the process exit status.
///
/// Success only when no video failed; 130 when interrupted.
#[must_use]
pub fn exit_code(outcome: &crate::Result<BatchSummary>) -> ExitCode {
    match outcome {
        Ok(summary) if summary.has_failures() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(Error::Cancelled) => ExitCode::from(EXIT_INTERRUPTED),
        Err(_) => ExitCode::FAILURE,
    }
}

/// Runs one subcommand to completion and prints its summary.
///
/// # Errors
///
/// Returns the first fatal error; per-video failures are in the summary.
pub async fn execute(cli: Cli) -> crate::Result<BatchSummary> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let out = cli
        .command
        .out()
        .cloned()
        .unwrap_or_else(|| config.default_out_dir.clone());
    log::info!("Output directory set to: {}", out.display());

    let token = CancellationToken::new();
    cancel_on_interrupt(token.clone());

    let batch = Batch::new(YtDlp::new(config.download), out).with_cancellation(token);
    let progress = CliProgress::new();

    let summary = match &cli.command {
        Command::Download { ids, .. } => {
            log::info!("Reading video ids from: {}", ids.display());
            batch.download_from_list(ids, &progress).await
        }
        Command::Channel { url, limit, .. } => {
            batch.download_channel(url, *limit, &progress).await
        }
    };
    progress.finish();
    let summary = summary?;

    print_summary(&summary);
    Ok(summary)
}
