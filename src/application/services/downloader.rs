use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{ClipStorage, ClipStorageError, MediaGateway, MediaGatewayError};
use crate::domain::{AudioDescriptor, AudioFormat, ProcessingStatus};

use super::StatusBoard;

const SIGNATURE_HEADER_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Unsupported format: {0}. Please resend the audio message.")]
    UnsupportedFormat(String),
    #[error("Could not download the audio from the messaging platform. Please try again.")]
    Gateway(#[source] MediaGatewayError),
    #[error("The audio file did not arrive completely. Please resend it.")]
    MissingAfterDownload,
    #[error(
        "Downloaded file size does not match (expected {expected} bytes, got {actual}). \
         Please resend the audio message."
    )]
    SizeMismatch { expected: u64, actual: u64 },
    #[error("The audio file appears corrupted or is not a supported format. Please record again.")]
    Corruption,
    #[error("Temporary storage error. Please try again later.")]
    Storage(#[source] ClipStorageError),
}

/// Fetches a validated clip's bytes into scoped temporary storage and
/// verifies what landed on disk.
///
/// A size mismatch is fatal with no retry: the platform already holds the
/// complete file, so a short read means the transfer itself is broken.
pub struct AudioDownloader {
    gateway: Arc<dyn MediaGateway>,
    storage: Arc<dyn ClipStorage>,
    statuses: Arc<StatusBoard>,
}

impl AudioDownloader {
    pub fn new(
        gateway: Arc<dyn MediaGateway>,
        storage: Arc<dyn ClipStorage>,
        statuses: Arc<StatusBoard>,
    ) -> Self {
        Self {
            gateway,
            storage,
            statuses,
        }
    }

    pub async fn download(&self, descriptor: &AudioDescriptor) -> Result<PathBuf, DownloadError> {
        let format = AudioFormat::from_mime(&descriptor.mime_type)
            .ok_or_else(|| DownloadError::UnsupportedFormat(descriptor.mime_type.clone()))?;

        self.statuses
            .set(&descriptor.file_id, ProcessingStatus::Downloading);

        let path = self
            .storage
            .allocate_path(descriptor.user_id, &descriptor.file_id, format);

        tracing::info!(
            file_id = %descriptor.file_id,
            file_size = descriptor.file_size,
            path = %path.display(),
            "Downloading clip"
        );

        if let Err(e) = self.gateway.download_to(&descriptor.file_id, &path).await {
            self.discard(&path).await;
            return Err(DownloadError::Gateway(e));
        }

        let actual = match self.storage.on_disk_size(&path).await {
            Ok(size) => size,
            Err(ClipStorageError::NotFound(_)) => return Err(DownloadError::MissingAfterDownload),
            Err(e) => {
                self.discard(&path).await;
                return Err(DownloadError::Storage(e));
            }
        };

        if actual != descriptor.file_size {
            self.discard(&path).await;
            return Err(DownloadError::SizeMismatch {
                expected: descriptor.file_size,
                actual,
            });
        }

        let header = match self.storage.read_prefix(&path, SIGNATURE_HEADER_LEN).await {
            Ok(header) => header,
            Err(_) => {
                self.discard(&path).await;
                return Err(DownloadError::Corruption);
            }
        };

        if !format.matches_signature(&header) {
            tracing::warn!(
                file_id = %descriptor.file_id,
                format = %format,
                "Downloaded file failed signature verification"
            );
            self.discard(&path).await;
            return Err(DownloadError::Corruption);
        }

        tracing::info!(file_id = %descriptor.file_id, "Clip downloaded and verified");
        Ok(path)
    }

    async fn discard(&self, path: &std::path::Path) {
        if let Err(e) = self.storage.remove_file(path).await {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to remove staged file after download failure"
            );
        }
    }
}
