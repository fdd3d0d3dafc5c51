//! Progress bar and summary reporting for CLI downloads.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::{
    BatchSummary, DownloadFailure, DownloadProgress, ProgressEvent, VideoId, format_bytes,
    format_elapsed, format_eta, format_speed,
};

const SEPARATOR: &str = "────────────────────────────────────────────────────────────";

/// Creates a progress bar for a single video download.
///
/// The length is unknown until the first progress event arrives.
pub fn make_progress_bar(id: &VideoId) -> ProgressBar {
    let bar = ProgressBar::no_length();
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold} [{bar:40.cyan/blue}] {percent:>3}% {bytes}/{total_bytes} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━╌"),
    );
    bar.set_prefix(id.to_string());
    bar
}

/// Creates the batch-level bar, advanced once per processed video.
///
/// Channel listings are lazy, so their length is unknown and the bar only
/// counts.
pub fn make_total_progress_bar(total: Option<usize>) -> ProgressBar {
    let (bar, template) = match total {
        Some(n) => (
            ProgressBar::new(n as u64),
            "Total [{bar:40.green/white}] {pos}/{len} videos ({elapsed})",
        ),
        None => (
            ProgressBar::no_length(),
            "{spinner:.green} Total {pos} videos ({elapsed})",
        ),
    };
    bar.set_style(
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━━╌"),
    );
    bar
}

/// Speed and ETA as reported by the download tool.
fn rate_message(event: &ProgressEvent) -> String {
    format!("@ {} ETA {}", format_speed(event.speed), format_eta(event.eta))
}

/// Terminal progress display.
///
/// Holds at most one video bar, created in `on_start` and cleared when that
/// download completes or fails, above the batch total bar.
pub struct CliProgress {
    multi: MultiProgress,
    total: Mutex<Option<ProgressBar>>,
    current: Mutex<Option<ProgressBar>>,
    last_size: Mutex<Option<u64>>,
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl CliProgress {
    /// Creates a display drawing to stderr.
    #[must_use]
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            total: Mutex::new(None),
            current: Mutex::new(None),
            last_size: Mutex::new(None),
        }
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Advances the batch bar by one video.
    fn advance(&self) {
        if let Some(total) = self.total.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            total.inc(1);
        }
    }

    /// Stops the batch bar, leaving its final state on screen.
    pub fn finish(&self) {
        if let Some(total) = self.total.lock().unwrap_or_else(PoisonError::into_inner).take() {
            total.finish();
        }
    }

    fn println(&self, line: String) {
        // Falls back to plain stderr when the terminal is hidden.
        if self.multi.println(&line).is_err() || self.multi.is_hidden() {
            eprintln!("{line}");
        }
    }
}

impl DownloadProgress for CliProgress {
    fn on_batch_start(&self, total: Option<usize>) {
        let bar = self.multi.add(make_total_progress_bar(total));
        bar.enable_steady_tick(Duration::from_millis(250));
        if let Some(previous) = self
            .total
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(bar)
        {
            previous.finish_and_clear();
        }
    }

    fn on_start(&self, id: &VideoId) {
        let bar = match self.total.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(total) => self.multi.insert_before(total, make_progress_bar(id)),
            None => self.multi.add(make_progress_bar(id)),
        };
        bar.enable_steady_tick(Duration::from_millis(120));
        *self.last_size.lock().unwrap_or_else(PoisonError::into_inner) = None;
        if let Some(previous) = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(bar)
        {
            previous.finish_and_clear();
        }
    }

    fn on_progress(&self, event: &ProgressEvent) {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(bar) = current.as_ref() else {
            return;
        };
        // Video and audio streams are fetched one after the other; a new
        // total restarts the bar.
        if let Some(total) = event.total_bytes
            && bar.length() != Some(total)
        {
            bar.set_length(total);
            bar.reset_eta();
        }
        bar.set_position(event.downloaded_bytes);
        bar.set_message(rate_message(event));
        if let Some(total) = event.total_bytes {
            let mut last = self.last_size.lock().unwrap_or_else(PoisonError::into_inner);
            *last = Some(last.unwrap_or(0).max(total));
        }
    }

    fn on_complete(&self, id: &VideoId) {
        if let Some(bar) = self.take_bar() {
            bar.finish_and_clear();
        }
        let size = self
            .last_size
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .map(|bytes| format!(" ({})", format_bytes(bytes)))
            .unwrap_or_default();
        self.println(format!("  {} {id}{size}", style("✓").green()));
        self.advance();
    }

    fn on_error(&self, failure: &DownloadFailure) {
        if let Some(bar) = self.take_bar() {
            bar.finish_and_clear();
        }
        self.println(format!(
            "  {} {} - {}",
            style("✗").red(),
            failure.id,
            failure.reason
        ));
        self.advance();
    }

    fn on_skipped(&self, id: &VideoId) {
        self.println(format!(
            "  {} {id} already downloaded, skipping",
            style("-").dim()
        ));
        self.advance();
    }
}

/// Prints a summary of the batch.
pub fn print_summary(summary: &BatchSummary) {
    println!("\n{SEPARATOR}");
    println!("Download Summary");
    println!("{SEPARATOR}");
    println!("  Downloaded:        {}", summary.downloaded);
    println!("  Skipped:           {}", summary.skipped);
    if summary.has_failures() {
        println!("  Failed:            {}", style(summary.failed()).red().bold());
    } else {
        println!("  Failed:            0");
    }
    if summary.invalid > 0 {
        println!("  Invalid lines:     {}", style(summary.invalid).yellow());
    }
    println!("  Total time:        {}", format_elapsed(summary.elapsed));

    if summary.has_failures() {
        println!("{SEPARATOR}");
        println!("Failed videos:");
        for failure in &summary.failures {
            println!("  - {}: {}", failure.id, failure.reason);
        }
    }
    println!("{SEPARATOR}");
}
