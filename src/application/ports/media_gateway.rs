use std::path::Path;

use async_trait::async_trait;

use crate::domain::FileHandleId;

/// Capability to download a platform-hosted file's bytes to a local path.
///
/// Implemented by the messaging-platform adapter; the core never talks to
/// the platform API directly.
#[async_trait]
pub trait MediaGateway: Send + Sync {
    async fn download_to(
        &self,
        file_id: &FileHandleId,
        destination: &Path,
    ) -> Result<(), MediaGatewayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaGatewayError {
    #[error("file not found on platform: {0}")]
    NotFound(String),
    #[error("platform request failed: {0}")]
    RequestFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
