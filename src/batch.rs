//! Sequential batch orchestration: skip what is on disk, download the rest.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use futures::{Stream, StreamExt, stream};
use tokio_util::sync::CancellationToken;

use crate::error::{DownloadFailure, Error, Result};
use crate::existing;
use crate::fs::{FileSystem, TokioFileSystem};
use crate::id::{VideoId, parse_id_list};
use crate::progress::DownloadProgress;
use crate::source::VideoSource;
use crate::stats::{BatchSummary, BatchSummaryBuilder};

/// One video to fetch into one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Video to download.
    pub id: VideoId,
    /// Directory the file is written to.
    pub out_dir: PathBuf,
}

/// Runs batches of downloads against a [`VideoSource`], one video at a time.
pub struct Batch<S: VideoSource, F: FileSystem = TokioFileSystem> {
    source: S,
    fs: F,
    out_dir: PathBuf,
    cancel: CancellationToken,
}

impl<S: VideoSource> Batch<S, TokioFileSystem> {
    /// Creates a batch writing into `out_dir` on the real file system.
    pub fn new(source: S, out_dir: impl Into<PathBuf>) -> Self {
        Self::with_fs(source, TokioFileSystem, out_dir)
    }
}

impl<S: VideoSource, F: FileSystem> Batch<S, F> {
    /// Creates a batch with a custom file system implementation.
    pub fn with_fs(source: S, fs: F, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            fs,
            out_dir: out_dir.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `token` to abort the batch, including the in-flight download.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a reference to the underlying video source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Returns the output directory.
    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Downloads every identifier listed in the file at `ids_path`.
    ///
    /// Blank lines are ignored. Lines that are not valid identifiers are
    /// logged, counted in [`BatchSummary::invalid`], and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Filesystem`] if the list cannot be read, plus any
    /// fatal error from [`Batch::run`].
    pub async fn download_from_list(
        &self,
        ids_path: &Path,
        progress: &dyn DownloadProgress,
    ) -> Result<BatchSummary> {
        let text = self
            .fs
            .read_to_string(ids_path)
            .await
            .map_err(|e| Error::filesystem(ids_path, e))?;

        let mut ids = Vec::new();
        let mut invalid = 0;
        for (line_no, parsed) in parse_id_list(&text) {
            match parsed {
                Ok(id) => ids.push(id),
                Err(e) => {
                    log::warn!("{}:{line_no}: skipping line: {e}", ids_path.display());
                    invalid += 1;
                }
            }
        }
        log::info!(
            "Read {} video id(s) from {}",
            ids.len(),
            ids_path.display()
        );

        let mut builder = BatchSummaryBuilder::new();
        builder.set_invalid(invalid);
        let total = Some(ids.len());
        self.process(stream::iter(ids.into_iter().map(Ok)), total, builder, progress)
            .await
    }

    /// Downloads the uploads of the channel at `url`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelResolution`] if the channel cannot be listed,
    /// plus any fatal error from [`Batch::run`].
    pub async fn download_channel(
        &self,
        url: &str,
        limit: Option<NonZeroUsize>,
        progress: &dyn DownloadProgress,
    ) -> Result<BatchSummary> {
        match limit {
            Some(n) => log::info!("Fetching the last {n} video(s) from {url}"),
            None => log::info!("Fetching all videos from {url}"),
        }
        let listing = self.source.resolve_channel(url, limit).await?;
        let summary = self.run(listing, progress).await?;
        if summary.processed() == 0 {
            log::warn!("No videos found in channel {url}");
        }
        Ok(summary)
    }

    /// Processes `ids` in order: skip if present, otherwise download.
    ///
    /// A [`Error::Download`] from the source is recorded in the summary and
    /// the batch continues. An `Err` item in `ids` or any other error stops
    /// the batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Filesystem`] if the output directory cannot be created
    /// or scanned, [`Error::Cancelled`] on cancellation, or the first fatal
    /// error from the identifier stream or the source.
    pub async fn run<I>(&self, ids: I, progress: &dyn DownloadProgress) -> Result<BatchSummary>
    where
        I: Stream<Item = Result<VideoId>> + Send,
    {
        self.process(ids, None, BatchSummaryBuilder::new(), progress)
            .await
    }

    async fn process<I>(
        &self,
        ids: I,
        total: Option<usize>,
        mut builder: BatchSummaryBuilder,
        progress: &dyn DownloadProgress,
    ) -> Result<BatchSummary>
    where
        I: Stream<Item = Result<VideoId>> + Send,
    {
        self.fs
            .create_dir_all(&self.out_dir)
            .await
            .map_err(|e| Error::filesystem(&self.out_dir, e))?;

        progress.on_batch_start(total);
        let mut ids = std::pin::pin!(ids);

        loop {
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(Error::Cancelled),
                next = ids.next() => next,
            };
            let Some(id) = next.transpose()? else { break };

            if existing::is_downloaded(&self.fs, &self.out_dir, &id).await? {
                log::debug!("Skipping {id}: already in {}", self.out_dir.display());
                progress.on_skipped(&id);
                builder.add_skipped();
                continue;
            }

            let task = DownloadTask {
                id,
                out_dir: self.out_dir.clone(),
            };
            match self.execute(&task, progress).await {
                Ok(()) => builder.add_download(),
                Err(Error::Download(failure)) => builder.add_failure(failure),
                Err(e) => return Err(e),
            }
        }

        Ok(builder.build())
    }

    async fn execute(&self, task: &DownloadTask, progress: &dyn DownloadProgress) -> Result<()> {
        log::debug!("Downloading {} into {}", task.id, task.out_dir.display());
        progress.on_start(&task.id);

        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::Cancelled),
            res = self.source.download(&task.id, &task.out_dir, progress) => res,
        };

        match &result {
            Ok(()) => progress.on_complete(&task.id),
            Err(Error::Download(failure)) => {
                log::debug!("Download failed: {failure}");
                progress.on_error(failure);
            }
            Err(e) => progress.on_error(&DownloadFailure {
                id: task.id.clone(),
                reason: e.to_string(),
            }),
        }
        result
    }
}
