//! Error types for the vfetch library.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::id::VideoId;

/// A single video that could not be downloaded.
///
/// Carried inside [`Error::Download`]; the batch records it and moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
    /// The video that failed.
    pub id: VideoId,
    /// Human-readable reason reported by the download tool.
    pub reason: String,
}

impl fmt::Display for DownloadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.reason)
    }
}

/// Errors that can occur while resolving or downloading videos.
#[derive(Error, Debug)]
pub enum Error {
    /// A line or URL could not be turned into a video identifier.
    #[error("Invalid video identifier {input:?}: {reason}")]
    InvalidIdentifier {
        /// The offending input, trimmed.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The channel URL did not resolve to a list of uploads.
    #[error("Could not resolve channel: {0}")]
    ChannelResolution(String),

    /// One video failed to download.
    #[error("Download failed for {0}")]
    Download(DownloadFailure),

    /// The output directory or the id list could not be read or written.
    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The external download tool could not be started.
    #[error("Download tool unavailable: {0}")]
    ToolUnavailable(String),

    /// The configuration file is unreadable or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The batch was interrupted.
    #[error("Cancelled")]
    Cancelled,
}

impl Error {
    /// Builds a [`Error::Filesystem`] for `path`.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the error must stop the whole batch.
    ///
    /// Per-video failures and unparseable lines are recovered locally.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Download(_) | Self::InvalidIdentifier { .. })
    }
}

/// A specialized `Result` type for vfetch operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_failures_are_not_fatal() {
        let err = Error::Download(DownloadFailure {
            id: VideoId::new("abc123").unwrap(),
            reason: "Video unavailable".to_string(),
        });
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "Download failed for abc123: Video unavailable");
    }

    #[test]
    fn filesystem_errors_are_fatal() {
        let err = Error::filesystem(
            "/nope",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_fatal());
        assert!(err.to_string().contains("/nope"));
    }

    #[test]
    fn channel_errors_are_fatal() {
        assert!(Error::ChannelResolution("private".into()).is_fatal());
        assert!(Error::Cancelled.is_fatal());
    }
}
