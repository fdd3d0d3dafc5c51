//! Detection of videos already present in the output directory.

use std::io;
use std::path::Path;

use crate::error::{Error, Result};
use crate::fs::FileSystem;
use crate::id::VideoId;

/// Returns `true` if any file directly inside `dir` has `id` in its name.
///
/// This is a substring match on file names, not a content check: an id that
/// is a substring of another video's id matches that video's file too, and a
/// truncated file left by an interrupted run counts as downloaded. A missing
/// directory means nothing has been downloaded yet.
///
/// # Errors
///
/// Returns [`Error::Filesystem`] if the directory exists but cannot be listed.
pub async fn is_downloaded<F: FileSystem + ?Sized>(fs: &F, dir: &Path, id: &VideoId) -> Result<bool> {
    match fs.list_file_names(dir).await {
        Ok(names) => Ok(names.iter().any(|name| name.contains(id.as_str()))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::filesystem(dir, e)),
    }
}
