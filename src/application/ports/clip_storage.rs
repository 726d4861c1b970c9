use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{AudioFormat, FileHandleId, UserId};

/// Scoped temporary storage for clip bytes during the processing window.
///
/// One shared directory, one uniquely named file per clip; nothing here
/// outlives processing plus the janitor's stale-age grace.
#[async_trait]
pub trait ClipStorage: Send + Sync {
    /// Build a unique destination path for a clip. The name embeds the
    /// owning user, a timestamp, and a fragment of the file handle so
    /// concurrent clips never collide.
    fn allocate_path(&self, user_id: UserId, file_id: &FileHandleId, format: AudioFormat)
        -> PathBuf;

    /// Size of a staged file on disk, or `NotFound` if it is missing.
    async fn on_disk_size(&self, path: &Path) -> Result<u64, ClipStorageError>;

    /// Read up to `len` leading bytes for signature verification.
    async fn read_prefix(&self, path: &Path, len: usize) -> Result<Vec<u8>, ClipStorageError>;

    /// Delete a staged file. Missing files are not an error.
    async fn remove_file(&self, path: &Path) -> Result<(), ClipStorageError>;

    /// Staged files whose modification time is older than `older_than`.
    async fn stale_files(&self, older_than: Duration) -> Result<Vec<PathBuf>, ClipStorageError>;

    /// Number of staged files currently on disk.
    async fn staged_file_count(&self) -> Result<usize, ClipStorageError>;

    /// Free bytes on the volume holding the temp directory, or `None`
    /// when it cannot be determined.
    fn available_space(&self) -> Option<u64>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClipStorageError {
    #[error("staged file not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
