use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::application::ports::{ClipStorage, ClipStorageError};

pub const MAX_TEMP_FILE_AGE: Duration = Duration::from_secs(30 * 60);
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);
const RETRY_AFTER_ERROR: Duration = Duration::from_secs(60);
const HELD_OPEN_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Disk hygiene for the shared temp directory.
///
/// Deletions are best-effort throughout: a missing file is success, a file
/// that appears held open gets one brief retry, and the periodic sweep
/// logs and restarts its loop on unexpected failure instead of dying.
pub struct TempFileJanitor {
    storage: Arc<dyn ClipStorage>,
    max_age: Duration,
}

impl TempFileJanitor {
    pub fn new(storage: Arc<dyn ClipStorage>) -> Self {
        Self::with_max_age(storage, MAX_TEMP_FILE_AGE)
    }

    pub fn with_max_age(storage: Arc<dyn ClipStorage>, max_age: Duration) -> Self {
        Self { storage, max_age }
    }

    /// Delete one staged file.
    pub async fn cleanup_one(&self, path: &Path) {
        match self.storage.remove_file(path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Staged file removed");
            }
            Err(first) => {
                tracing::warn!(
                    error = %first,
                    path = %path.display(),
                    "Staged file removal failed, retrying once"
                );
                tokio::time::sleep(HELD_OPEN_RETRY_DELAY).await;
                if let Err(e) = self.storage.remove_file(path).await {
                    tracing::warn!(
                        error = %e,
                        path = %path.display(),
                        "Giving up on staged file removal"
                    );
                }
            }
        }
    }

    /// Remove every staged file older than the stale age. Returns how many
    /// were deleted.
    pub async fn sweep_all(&self) -> Result<usize, ClipStorageError> {
        let stale = self.storage.stale_files(self.max_age).await?;
        let mut removed = 0;
        for path in stale {
            match self.storage.remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Stale file not removed");
                }
            }
        }
        if removed > 0 {
            tracing::info!(removed, "Temp file sweep removed stale clips");
        }
        Ok(removed)
    }

    /// Long-lived background loop on a fixed interval until the returned
    /// handle is aborted at shutdown.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(interval_secs = interval.as_secs(), "Temp file janitor started");
            loop {
                match self.sweep_all().await {
                    Ok(_) => tokio::time::sleep(interval).await,
                    Err(e) => {
                        tracing::error!(error = %e, "Temp file sweep failed; retrying shortly");
                        tokio::time::sleep(RETRY_AFTER_ERROR).await;
                    }
                }
            }
        })
    }
}
