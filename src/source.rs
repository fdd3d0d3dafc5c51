//! The seam between the batch and whatever actually fetches videos.

use std::num::NonZeroUsize;
use std::path::Path;

use async_trait::async_trait;
use futures::stream::BoxStream;
use url::Url;

use crate::error::{Error, Result};
use crate::id::VideoId;
use crate::progress::DownloadProgress;

/// Channel uploads, most recent first.
///
/// Finite and single-pass. An `Err` item means the channel could not be
/// (fully) resolved.
pub type ChannelListing = BoxStream<'static, Result<VideoId>>;

/// Hosts accepted for channel URLs.
const CHANNEL_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com"];

/// Path segments that introduce a named channel (`/c/<name>` and friends).
const CHANNEL_PATH_KINDS: &[&str] = &["channel", "c", "user"];

/// Something that can list a channel and download single videos.
///
/// [`crate::YtDlp`] is the real implementation; tests substitute fakes.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Lists the uploads of the channel at `url`, truncated to `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelResolution`] if `url` is not a channel URL or
    /// the listing cannot be started.
    async fn resolve_channel(&self, url: &str, limit: Option<NonZeroUsize>) -> Result<ChannelListing>;

    /// Downloads one video into `out_dir`, reporting progress to `progress`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Download`] when this video failed; any other error
    /// means no further download can succeed.
    async fn download(&self, id: &VideoId, out_dir: &Path, progress: &dyn DownloadProgress) -> Result<()>;
}

/// Normalizes a channel URL to its uploads tab (`.../videos`).
///
/// # Errors
///
/// Returns [`Error::ChannelResolution`] if `url` is malformed or does not
/// point at a YouTube channel.
pub fn channel_videos_url(url: &str) -> Result<String> {
    let mut parsed = Url::parse(url.trim())
        .map_err(|e| Error::ChannelResolution(format!("{url}: malformed URL: {e}")))?;

    let host = parsed.host_str().map(str::to_ascii_lowercase).unwrap_or_default();
    if !CHANNEL_HOSTS.contains(&host.as_str()) {
        return Err(Error::ChannelResolution(format!("{url}: not a YouTube URL")));
    }

    let path = {
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let root_len = match segments.first() {
            Some(handle) if handle.starts_with('@') && handle.len() > 1 => 1,
            Some(kind) if CHANNEL_PATH_KINDS.contains(kind) && segments.len() > 1 => 2,
            _ => return Err(Error::ChannelResolution(format!("{url}: not a channel URL"))),
        };
        // Any tab after the channel root (streams, shorts, ...) is replaced.
        format!("/{}/videos", segments[..root_len].join("/"))
    };
    parsed.set_path(&path);
    Ok(parsed.into())
}
