use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{MediaGateway, MediaGatewayError};
use crate::domain::FileHandleId;

/// Downloads platform-hosted files through the Telegram Bot API: resolve
/// the handle with `getFile`, then stream the bytes to the destination.
pub struct TelegramMediaGateway {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

#[derive(Deserialize)]
struct GetFileResponse {
    ok: bool,
    result: Option<FileInfo>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

impl TelegramMediaGateway {
    pub fn new(bot_token: String, api_base: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.unwrap_or_else(|| "https://api.telegram.org".to_string()),
            bot_token,
        }
    }

    async fn resolve_path(&self, file_id: &FileHandleId) -> Result<String, MediaGatewayError> {
        let url = format!("{}/bot{}/getFile", self.api_base, self.bot_token);
        let response = self
            .client
            .get(&url)
            .query(&[("file_id", file_id.as_str())])
            .send()
            .await
            .map_err(|e| MediaGatewayError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaGatewayError::RequestFailed(format!(
                "getFile status {}: {}",
                status, body
            )));
        }

        let parsed: GetFileResponse = response
            .json()
            .await
            .map_err(|e| MediaGatewayError::RequestFailed(format!("parse getFile: {}", e)))?;

        if !parsed.ok {
            return Err(MediaGatewayError::NotFound(
                parsed
                    .description
                    .unwrap_or_else(|| file_id.as_str().to_string()),
            ));
        }

        parsed
            .result
            .and_then(|f| f.file_path)
            .ok_or_else(|| MediaGatewayError::NotFound(file_id.as_str().to_string()))
    }
}

#[async_trait]
impl MediaGateway for TelegramMediaGateway {
    async fn download_to(
        &self,
        file_id: &FileHandleId,
        destination: &Path,
    ) -> Result<(), MediaGatewayError> {
        let remote_path = self.resolve_path(file_id).await?;
        let url = format!(
            "{}/file/bot{}/{}",
            self.api_base, self.bot_token, remote_path
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MediaGatewayError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediaGatewayError::RequestFailed(format!(
                "file download status {}",
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(destination).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| MediaGatewayError::RequestFailed(e.to_string()))?;
            file.write_all(&bytes).await?;
        }
        file.flush().await?;

        tracing::debug!(
            file_id = %file_id,
            destination = %destination.display(),
            "Platform file downloaded"
        );
        Ok(())
    }
}
