//! vfetch - A library for batch-downloading YouTube videos through yt-dlp.
//!
//! This library provides the batch logic (id normalization, skip-existing
//! checks, sequential downloads, summaries) abstracted from any specific
//! UI or display framework.
//!
//! # Example
//!
//! ```no_run
//! use vfetch::{Batch, DownloadConfig, NoProgress, YtDlp};
//!
//! # async fn example() -> vfetch::Result<()> {
//! let source = YtDlp::new(DownloadConfig::default().with_max_height(720));
//! let batch = Batch::new(source, "outputs/default");
//!
//! // Download every id or URL listed in a file, one per line
//! let summary = batch
//!     .download_from_list("ids.txt".as_ref(), &NoProgress)
//!     .await?;
//! println!("Downloaded {} videos", summary.downloaded);
//!
//! // Download the five latest uploads of a channel
//! let limit = std::num::NonZeroUsize::new(5);
//! let summary = batch
//!     .download_channel("https://www.youtube.com/@SomeChannel", limit, &NoProgress)
//!     .await?;
//! println!("{} failed", summary.failed());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod batch;
pub mod config;
pub mod error;
pub mod existing;
pub mod format;
pub mod fs;
pub mod id;
pub mod progress;
pub mod source;
pub mod stats;
pub mod ytdlp;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export main types for convenience
pub use batch::{Batch, DownloadTask};
pub use config::{AppConfig, DownloadConfig};
pub use error::{DownloadFailure, Error, Result};
pub use format::{format_bytes, format_elapsed, format_eta, format_speed};
pub use fs::{FileSystem, TokioFileSystem};
pub use id::{VideoId, normalize_line, parse_id_list};
pub use progress::{DownloadProgress, NoProgress, ProgressEvent};
pub use source::{ChannelListing, VideoSource};
pub use stats::{BatchSummary, BatchSummaryBuilder};
pub use ytdlp::YtDlp;
