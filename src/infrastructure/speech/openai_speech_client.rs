use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::application::ports::{SpeechError, SpeechRequest, SpeechResponse, SpeechToText};
use crate::domain::AudioFormat;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Speech-to-text over the OpenAI-compatible `audio/transcriptions`
/// endpoint. Failures are classified into the closed `SpeechError`
/// taxonomy here, at the transport layer.
pub struct OpenAiSpeechClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
    language: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    code: Option<String>,
}

impl OpenAiSpeechClient {
    pub fn new(api_key: String, base_url: Option<String>, model: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: model.unwrap_or_else(|| "whisper-1".to_string()),
        }
    }

    fn classify_status(status: StatusCode, body: &str) -> SpeechError {
        let detail: Option<ApiErrorDetail> = serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|b| b.error);
        let message = detail
            .as_ref()
            .and_then(|d| d.message.clone())
            .unwrap_or_else(|| body.to_string());
        let code = detail.and_then(|d| d.code);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SpeechError::Auth(message),
            StatusCode::TOO_MANY_REQUESTS => {
                if code.as_deref() == Some("insufficient_quota") {
                    SpeechError::QuotaExhausted(message)
                } else {
                    SpeechError::RateLimited(message)
                }
            }
            StatusCode::UNSUPPORTED_MEDIA_TYPE => SpeechError::UnsupportedFormat(message),
            StatusCode::BAD_REQUEST => SpeechError::InvalidAudio(message),
            s if s.is_server_error() => SpeechError::Server {
                status: s.as_u16(),
                message,
            },
            s => SpeechError::Network(format!("unexpected status {}: {}", s, message)),
        }
    }

    fn mime_for(path: &std::path::Path) -> &'static str {
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(AudioFormat::from_extension);
        match format {
            Some(AudioFormat::Mp3) => "audio/mpeg",
            Some(AudioFormat::M4a) => "audio/mp4",
            Some(AudioFormat::Mp4) => "video/mp4",
            Some(AudioFormat::Wav) => "audio/wav",
            Some(AudioFormat::Webm) => "audio/webm",
            Some(AudioFormat::Ogg) | None => "audio/ogg",
        }
    }
}

#[async_trait]
impl SpeechToText for OpenAiSpeechClient {
    async fn transcribe(&self, request: &SpeechRequest) -> Result<SpeechResponse, SpeechError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let audio_data = tokio::fs::read(&request.file_path).await?;
        let file_name = request
            .file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();

        let file_part = multipart::Part::bytes(audio_data)
            .file_name(file_name)
            .mime_str(Self::mime_for(&request.file_path))
            .map_err(|e| SpeechError::InvalidAudio(format!("mime: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("language", request.language.clone())
            .text("response_format", "json")
            .part("file", file_part);

        tracing::debug!(
            model = %self.model,
            language = %request.language,
            "Sending audio to speech service"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpeechError::Timeout(e.to_string())
                } else {
                    SpeechError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Self::classify_status(status, &body));
        }

        let result: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Network(format!("parse response: {}", e)))?;

        tracing::info!(chars = result.text.len(), "Speech service transcription completed");

        Ok(SpeechResponse {
            text: result.text,
            detected_language: result.language,
        })
    }
}
