//! [`VideoSource`] backed by the `yt-dlp` command-line tool.

use std::ffi::OsString;
use std::io;
use std::num::NonZeroUsize;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use regex::Regex;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Split};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::config::DownloadConfig;
use crate::error::{DownloadFailure, Error, Result};
use crate::id::VideoId;
use crate::progress::{DownloadProgress, ProgressEvent};
use crate::source::{ChannelListing, VideoSource, channel_videos_url};

/// Prefix yt-dlp puts in front of each JSON progress line.
const PROGRESS_MARKER: &str = "[vfetch] ";

/// Matches `ERROR: [extractor] id: reason` and plain `ERROR: reason`.
static ERROR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ERROR:\s*(?:\[[^\]]+\]\s*[^\s:]+:\s*)?(.+)$").expect("valid regex")
});

/// Progress dictionary as printed by `--progress-template '%(progress)j'`.
#[derive(Debug, Deserialize)]
struct YtDlpProgress {
    status: String,
    downloaded_bytes: Option<f64>,
    total_bytes: Option<f64>,
    total_bytes_estimate: Option<f64>,
    speed: Option<f64>,
    eta: Option<f64>,
}

/// Drives the `yt-dlp` executable as a child process.
#[derive(Debug, Clone, Default)]
pub struct YtDlp {
    config: DownloadConfig,
}

impl YtDlp {
    /// Creates a source using the given download configuration.
    #[must_use]
    pub const fn new(config: DownloadConfig) -> Self {
        Self { config }
    }

    /// Returns the download configuration.
    #[must_use]
    pub const fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Builds the format selector: MP4 video with M4A audio first, then any
    /// combination at or below the height ceiling.
    #[must_use]
    pub fn format_selector(&self) -> String {
        let h = self.config.max_height;
        format!(
            "bestvideo[ext=mp4][height<={h}]+bestaudio[ext=m4a]\
             /best[ext=mp4][height<={h}]\
             /bestvideo[height<={h}]+bestaudio\
             /best[height<={h}]"
        )
    }

    /// Builds the argument list for downloading `id` into `out_dir`.
    #[must_use]
    pub fn download_args(&self, id: &VideoId, out_dir: &Path) -> Vec<OsString> {
        let selector = self.format_selector();
        let template = format!("download:{PROGRESS_MARKER}%(progress)j");
        let mut args: Vec<OsString> = [
            "--format",
            selector.as_str(),
            "--merge-output-format",
            "mp4",
            "--recode-video",
            "mp4",
            "--no-playlist",
            "--newline",
            "--quiet",
            "--progress",
            "--no-warnings",
            "--progress-template",
            template.as_str(),
            "--output",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(out_dir.join(&self.config.output_template).into_os_string());
        args.push("--".into());
        args.push(id.watch_url().into());
        args
    }

    /// Builds the argument list for listing the uploads at `list_url`.
    #[must_use]
    pub fn listing_args(list_url: &str, limit: Option<NonZeroUsize>) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["--flat-playlist", "--print", "id", "--no-warnings"]
            .into_iter()
            .map(OsString::from)
            .collect();
        if let Some(limit) = limit {
            args.push("--playlist-end".into());
            args.push(limit.to_string().into());
        }
        args.push("--".into());
        args.push(list_url.into());
        args
    }

    fn spawn(&self, args: &[OsString]) -> Result<Child> {
        log::debug!("Running {} {:?}", self.config.ytdlp_path.display(), args);
        Command::new(&self.config.ytdlp_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                let tool = self.config.ytdlp_path.display();
                if e.kind() == io::ErrorKind::NotFound {
                    Error::ToolUnavailable(format!("{tool} not found; is yt-dlp installed?"))
                } else {
                    Error::ToolUnavailable(format!("{tool}: {e}"))
                }
            })
    }
}

#[async_trait]
impl VideoSource for YtDlp {
    async fn resolve_channel(&self, url: &str, limit: Option<NonZeroUsize>) -> Result<ChannelListing> {
        let list_url = channel_videos_url(url)?;
        log::debug!("Listing uploads from {list_url}");

        let mut child = self.spawn(&Self::listing_args(&list_url, limit))?;
        let (stdout, stderr) = take_pipes(&mut child)?;

        let state = Listing {
            lines: BufReader::new(stdout).split(b'\n'),
            child,
            stderr: collect_stderr(stderr),
            url: list_url,
            yielded: 0,
            limit: limit.map(NonZeroUsize::get),
            done: false,
        };
        Ok(futures::stream::unfold(state, Listing::next).boxed())
    }

    async fn download(&self, id: &VideoId, out_dir: &Path, progress: &dyn DownloadProgress) -> Result<()> {
        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|e| Error::filesystem(out_dir, e))?;

        let mut child = self.spawn(&self.download_args(id, out_dir))?;
        let (stdout, stderr) = take_pipes(&mut child)?;
        let stderr = collect_stderr(stderr);

        let mut lines = BufReader::new(stdout).split(b'\n');
        while let Some(line) = next_line(&mut lines).await {
            if let Some(event) = parse_progress_line(id, &line) {
                progress.on_progress(&event);
            } else if !line.is_empty() {
                log::debug!("yt-dlp stdout: {line}");
            }
        }

        let status = child.wait().await;
        let reason = stderr.await.unwrap_or_default();
        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(Error::Download(DownloadFailure {
                id: id.clone(),
                reason: reason.unwrap_or_else(|| exit_reason(status)),
            })),
            Err(e) => Err(Error::Download(DownloadFailure {
                id: id.clone(),
                reason: format!("waiting for yt-dlp failed: {e}"),
            })),
        }
    }
}

/// State of an in-progress channel listing.
///
/// Dropping it kills the child process, which is how a `limit` or an
/// abandoned batch stops the listing early.
struct Listing {
    lines: Split<BufReader<ChildStdout>>,
    child: Child,
    stderr: JoinHandle<Option<String>>,
    url: String,
    yielded: usize,
    limit: Option<usize>,
    done: bool,
}

impl Listing {
    async fn next(mut self) -> Option<(Result<VideoId>, Self)> {
        if self.done || self.limit.is_some_and(|limit| self.yielded >= limit) {
            return None;
        }

        while let Some(line) = next_line(&mut self.lines).await {
            if line.is_empty() {
                continue;
            }
            match VideoId::new(line.as_str()) {
                Ok(id) => {
                    self.yielded += 1;
                    return Some((Ok(id), self));
                }
                Err(e) => log::warn!("Ignoring listing entry from {}: {e}", self.url),
            }
        }

        self.done = true;
        let status = self.child.wait().await;
        let reason = (&mut self.stderr).await.unwrap_or_default();
        let failure = match status {
            Ok(status) if status.success() => return None,
            Ok(status) => reason.unwrap_or_else(|| exit_reason(status)),
            Err(e) => format!("waiting for yt-dlp failed: {e}"),
        };

        if self.yielded == 0 {
            let err = Error::ChannelResolution(format!("{}: {failure}", self.url));
            Some((Err(err), self))
        } else {
            log::warn!(
                "Listing of {} ended early after {} video(s): {failure}",
                self.url,
                self.yielded
            );
            None
        }
    }
}

fn take_pipes(child: &mut Child) -> Result<(ChildStdout, ChildStderr)> {
    match (child.stdout.take(), child.stderr.take()) {
        (Some(stdout), Some(stderr)) => Ok((stdout, stderr)),
        _ => Err(Error::ToolUnavailable("yt-dlp output pipes unavailable".into())),
    }
}

/// Reads the next `\n`-terminated line, lossily decoded and trimmed.
///
/// Read errors end the stream like EOF does; the exit status reports the
/// actual failure.
async fn next_line<R: AsyncRead + Unpin>(lines: &mut Split<BufReader<R>>) -> Option<String> {
    match lines.next_segment().await {
        Ok(Some(bytes)) => Some(String::from_utf8_lossy(&bytes).trim().to_string()),
        Ok(None) => None,
        Err(e) => {
            log::debug!("Reading yt-dlp output failed: {e}");
            None
        }
    }
}

/// Drains stderr in the background, returning the last error reason seen.
fn collect_stderr(stderr: ChildStderr) -> JoinHandle<Option<String>> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).split(b'\n');
        let mut reason = None;
        while let Some(line) = next_line(&mut lines).await {
            if line.is_empty() {
                continue;
            }
            log::debug!("yt-dlp stderr: {line}");
            if let Some(found) = error_reason(&line) {
                reason = Some(found);
            }
        }
        reason
    })
}

/// Extracts the human-readable part of a yt-dlp `ERROR:` line.
#[must_use]
pub fn error_reason(line: &str) -> Option<String> {
    ERROR_RE
        .captures(line.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn exit_reason(status: ExitStatus) -> String {
    status.code().map_or_else(
        || "yt-dlp was terminated by a signal".to_string(),
        |code| format!("yt-dlp exited with status {code}"),
    )
}

/// Parses one `--progress-template` line into a [`ProgressEvent`].
///
/// Returns `None` for anything that is not a progress line.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_progress_line(id: &VideoId, line: &str) -> Option<ProgressEvent> {
    let json = line.trim().strip_prefix(PROGRESS_MARKER)?;
    let raw: YtDlpProgress = serde_json::from_str(json).ok()?;

    let total = raw
        .total_bytes
        .or(raw.total_bytes_estimate)
        .filter(|t| t.is_finite() && *t > 0.0)
        .map(|t| t as u64);
    let downloaded = match raw.status.as_str() {
        "downloading" => raw.downloaded_bytes.unwrap_or(0.0).max(0.0) as u64,
        "finished" => raw
            .downloaded_bytes
            .map(|b| b.max(0.0) as u64)
            .or(total)
            .unwrap_or(0),
        _ => return None,
    };

    Some(ProgressEvent {
        id: id.clone(),
        downloaded_bytes: downloaded,
        total_bytes: total,
        speed: raw.speed.filter(|s| s.is_finite() && *s >= 0.0),
        eta: raw
            .eta
            .and_then(|e| Duration::try_from_secs_f64(e).ok()),
    })
}
