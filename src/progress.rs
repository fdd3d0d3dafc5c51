//! Progress reporting for a batch of downloads.

use std::time::Duration;

use crate::error::DownloadFailure;
use crate::id::VideoId;

/// One transfer-progress sample for an in-flight download.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Video being downloaded.
    pub id: VideoId,
    /// Bytes transferred so far for the current stream.
    pub downloaded_bytes: u64,
    /// Expected size of the current stream, exact or estimated.
    pub total_bytes: Option<u64>,
    /// Instantaneous speed in bytes per second.
    pub speed: Option<f64>,
    /// Estimated time remaining.
    pub eta: Option<Duration>,
}

impl ProgressEvent {
    /// Percentage complete, clamped to `0.0..=100.0`, if the total is known.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> Option<f64> {
        self.total_bytes
            .filter(|&total| total > 0)
            .map(|total| (self.downloaded_bytes as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
    }
}

/// Trait for receiving progress updates from a batch.
///
/// A batch opens with `on_batch_start`. One download spans `on_start` to either `on_complete` or `on_error`;
/// implementations should not carry display state past that window.
/// All methods have default no-op implementations for convenience.
pub trait DownloadProgress: Send + Sync {
    /// Called once before the first video; `total` is `None` when the
    /// number of videos is not known up front (channel listings).
    fn on_batch_start(&self, _total: Option<usize>) {}

    /// Called when a video download starts.
    fn on_start(&self, _id: &VideoId) {}

    /// Called for every progress sample reported by the download tool.
    fn on_progress(&self, _event: &ProgressEvent) {}

    /// Called when a video download completes successfully.
    fn on_complete(&self, _id: &VideoId) {}

    /// Called when a video download fails.
    fn on_error(&self, _failure: &DownloadFailure) {}

    /// Called when a video is skipped because it is already on disk.
    fn on_skipped(&self, _id: &VideoId) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl DownloadProgress for NoProgress {}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(downloaded: u64, total: Option<u64>) -> ProgressEvent {
        ProgressEvent {
            id: VideoId::new("abc123").unwrap(),
            downloaded_bytes: downloaded,
            total_bytes: total,
            speed: None,
            eta: None,
        }
    }

    #[test]
    fn no_progress_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoProgress>();
    }

    #[test]
    fn percent_from_totals() {
        assert_eq!(event(50, Some(200)).percent(), Some(25.0));
        assert_eq!(event(200, Some(200)).percent(), Some(100.0));
    }

    #[test]
    fn percent_unknown_without_total() {
        assert_eq!(event(50, None).percent(), None);
        assert_eq!(event(50, Some(0)).percent(), None);
    }

    #[test]
    fn percent_is_clamped() {
        // Estimated totals can undershoot.
        assert_eq!(event(300, Some(200)).percent(), Some(100.0));
    }
}
