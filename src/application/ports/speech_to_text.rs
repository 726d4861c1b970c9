use std::path::PathBuf;

use async_trait::async_trait;

/// One transcription request to the external speech service.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub file_path: PathBuf,
    /// Fixed language hint; no multi-language detection.
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct SpeechResponse {
    pub text: String,
    pub detected_language: Option<String>,
}

/// Closed error taxonomy produced at the point of failure.
///
/// The transport adapter classifies each failure into one of these kinds;
/// nothing upstream re-parses error text. `is_recoverable` decides retry
/// eligibility.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("speech service rate limit hit: {0}")]
    RateLimited(String),
    #[error("speech service unavailable ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("audio rejected by speech service: {0}")]
    InvalidAudio(String),
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("authentication with speech service failed: {0}")]
    Auth(String),
    #[error("speech service quota exhausted: {0}")]
    QuotaExhausted(String),
    #[error("io error reading audio file: {0}")]
    Io(#[from] std::io::Error),
}

impl SpeechError {
    /// Whether an automatic retry with backoff may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SpeechError::Network(_)
                | SpeechError::Timeout(_)
                | SpeechError::RateLimited(_)
                | SpeechError::Server { .. }
        )
    }
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, request: &SpeechRequest) -> Result<SpeechResponse, SpeechError>;
}
