//! Batch outcome statistics.

use std::time::{Duration, Instant};

use crate::error::DownloadFailure;

/// Outcome of one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Number of videos successfully downloaded.
    pub downloaded: usize,
    /// Number of videos skipped (already present).
    pub skipped: usize,
    /// Videos that failed, in batch order.
    pub failures: Vec<DownloadFailure>,
    /// Number of input lines that were not valid identifiers.
    pub invalid: usize,
    /// Total elapsed time for the batch.
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Number of failed videos.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Returns `true` if at least one video failed to download.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Number of identifiers the batch resolved (skipped, downloaded or failed).
    #[must_use]
    pub fn processed(&self) -> usize {
        self.downloaded + self.skipped + self.failed()
    }
}

/// Builder for accumulating batch statistics while videos are processed.
pub struct BatchSummaryBuilder {
    downloaded: usize,
    skipped: usize,
    failures: Vec<DownloadFailure>,
    invalid: usize,
    start_time: Instant,
}

impl Default for BatchSummaryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchSummaryBuilder {
    /// Creates a new builder; the batch clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            downloaded: 0,
            skipped: 0,
            failures: Vec::new(),
            invalid: 0,
            start_time: Instant::now(),
        }
    }

    /// Records a successful download.
    pub const fn add_download(&mut self) {
        self.downloaded += 1;
    }

    /// Records a skipped video.
    pub const fn add_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Records a failed video.
    pub fn add_failure(&mut self, failure: DownloadFailure) {
        self.failures.push(failure);
    }

    /// Sets the number of invalid input lines.
    pub const fn set_invalid(&mut self, count: usize) {
        self.invalid = count;
    }

    /// Builds the final summary.
    #[must_use]
    pub fn build(self) -> BatchSummary {
        BatchSummary {
            downloaded: self.downloaded,
            skipped: self.skipped,
            failures: self.failures,
            invalid: self.invalid,
            elapsed: self.start_time.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::VideoId;

    #[test]
    fn batch_summary_default() {
        let summary = BatchSummary::default();
        assert_eq!(summary.downloaded, 0);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.failed(), 0);
        assert!(!summary.has_failures());
    }

    #[test]
    fn batch_summary_builder() {
        let mut builder = BatchSummaryBuilder::new();
        builder.add_download();
        builder.add_download();
        builder.add_skipped();
        builder.set_invalid(3);
        builder.add_failure(DownloadFailure {
            id: VideoId::new("gone").unwrap(),
            reason: "Private video".to_string(),
        });

        let summary = builder.build();
        assert_eq!(summary.downloaded, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.invalid, 3);
        assert_eq!(summary.processed(), 4);
        assert!(summary.has_failures());
        assert_eq!(summary.failures[0].id.as_str(), "gone");
    }
}
