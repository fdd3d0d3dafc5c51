//! File system abstraction for testability.

use async_trait::async_trait;
use std::io;
use std::path::Path;

/// Abstraction over the file system operations the batch needs.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Lists the names of regular files directly inside `dir`.
    ///
    /// A missing directory is reported as [`io::ErrorKind::NotFound`].
    async fn list_file_names(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Creates all directories in the given path.
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Reads a whole file as UTF-8 text.
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Default file system implementation using `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    /// Creates a new `TokioFileSystem` instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn list_file_names(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}
