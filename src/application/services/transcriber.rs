use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    ClipStorage, ClipStorageError, SpeechError, SpeechRequest, SpeechToText,
};
use crate::domain::{AudioFormat, FileHandleId, ProcessingStatus, Transcript};

use super::validator::MAX_FILE_SIZE_BYTES;
use super::StatusBoard;

/// 1 initial attempt + 2 retries.
pub const MAX_ATTEMPTS: u32 = 3;
pub const BASE_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    #[error("Audio file not found for transcription. Please resend the audio message.")]
    FileMissing,
    #[error("Audio file is empty or corrupted. Please record the message again.")]
    EmptyFile,
    #[error("Audio file is too large ({actual_mb:.1}MB). The limit is {limit_mb}MB.")]
    FileTooLarge { actual_mb: f64, limit_mb: u64 },
    #[error("Unsupported audio file type: {0}.")]
    UnsupportedExtension(String),
    #[error(
        "Audio is too quiet or too noisy to transcribe. Try recording in a quieter \
         place, speaking closer to the microphone."
    )]
    Inaudible,
    #[error(
        "Transcription failed after {attempts} attempts: {source}. \
         Please try again in a few minutes or send a text message."
    )]
    RetriesExhausted { attempts: u32, source: SpeechError },
    #[error("Transcription failed: {0}")]
    Fatal(#[source] SpeechError),
}

/// Calls the speech service with bounded retries and exponential backoff.
///
/// Recoverable failures (network, timeout, rate limit, 5xx) are retried up
/// to the attempt cap with `base_delay * 2^attempt` sleeps; fatal failures
/// surface immediately without consuming retries. An empty transcript is a
/// quality failure, never retried.
pub struct Transcriber {
    speech: Arc<dyn SpeechToText>,
    storage: Arc<dyn ClipStorage>,
    statuses: Arc<StatusBoard>,
    language: String,
    max_attempts: u32,
    base_delay: Duration,
}

impl Transcriber {
    pub fn new(
        speech: Arc<dyn SpeechToText>,
        storage: Arc<dyn ClipStorage>,
        statuses: Arc<StatusBoard>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            speech,
            storage,
            statuses,
            language: language.into(),
            max_attempts: MAX_ATTEMPTS,
            base_delay: BASE_RETRY_DELAY,
        }
    }

    pub fn with_retry_policy(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.base_delay = base_delay;
        self
    }

    pub async fn transcribe(
        &self,
        file_id: &FileHandleId,
        path: &Path,
    ) -> Result<Transcript, TranscribeError> {
        self.statuses.set(file_id, ProcessingStatus::Transcribing);

        let file_size = self.revalidate(path).await?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(AudioFormat::from_extension);

        let request = SpeechRequest {
            file_path: path.to_path_buf(),
            language: self.language.clone(),
        };

        let started = std::time::Instant::now();

        for attempt in 0..self.max_attempts {
            tracing::info!(
                file_id = %file_id,
                attempt = attempt + 1,
                max_attempts = self.max_attempts,
                "Transcribing clip"
            );

            match self.speech.transcribe(&request).await {
                Ok(response) => {
                    let text = response.text.trim().to_string();
                    if text.is_empty() {
                        // Quality failure, not transport; retrying the same
                        // audio would yield the same silence.
                        return Err(TranscribeError::Inaudible);
                    }

                    let processing_time = started.elapsed().as_secs_f64();
                    let confidence = confidence_score(&text, file_size, processing_time);
                    let estimated_duration = format
                        .map(|f| estimate_duration_secs(file_size, f))
                        .unwrap_or(0.0);

                    tracing::info!(
                        file_id = %file_id,
                        chars = text.chars().count(),
                        confidence,
                        processing_time,
                        "Transcription completed"
                    );

                    return Ok(Transcript {
                        text,
                        confidence,
                        language: response.detected_language.unwrap_or_else(|| {
                            self.language.clone()
                        }),
                        estimated_duration_secs: estimated_duration,
                        processing_time_secs: processing_time,
                    });
                }
                Err(e) if e.is_recoverable() && attempt + 1 < self.max_attempts => {
                    let delay = self.base_delay * 2u32.pow(attempt);
                    tracing::warn!(
                        file_id = %file_id,
                        error = %e,
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs_f64(),
                        "Recoverable transcription error; backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_recoverable() => {
                    return Err(TranscribeError::RetriesExhausted {
                        attempts: self.max_attempts,
                        source: e,
                    });
                }
                Err(e) => {
                    tracing::error!(file_id = %file_id, error = %e, "Fatal transcription error");
                    return Err(TranscribeError::Fatal(e));
                }
            }
        }

        // Loop always returns before falling through; max_attempts >= 1.
        Err(TranscribeError::Fatal(SpeechError::Network(
            "no transcription attempt executed".to_string(),
        )))
    }

    /// Defensive re-check of the staged file right before upload.
    async fn revalidate(&self, path: &Path) -> Result<u64, TranscribeError> {
        let file_size = match self.storage.on_disk_size(path).await {
            Ok(size) => size,
            Err(ClipStorageError::NotFound(_)) => return Err(TranscribeError::FileMissing),
            Err(ClipStorageError::Io(_)) => return Err(TranscribeError::FileMissing),
        };

        if file_size == 0 {
            return Err(TranscribeError::EmptyFile);
        }
        if file_size > MAX_FILE_SIZE_BYTES {
            return Err(TranscribeError::FileTooLarge {
                actual_mb: file_size as f64 / (1024.0 * 1024.0),
                limit_mb: MAX_FILE_SIZE_BYTES / (1024 * 1024),
            });
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        if AudioFormat::from_extension(&extension).is_none() {
            return Err(TranscribeError::UnsupportedExtension(extension));
        }

        Ok(file_size)
    }
}

/// Heuristic confidence for a transcript the speech service does not score.
///
/// Base 0.8; long transcripts and larger, quickly processed files nudge it
/// up, very short transcripts pull it down. Clamped to [0, 1].
pub fn confidence_score(text: &str, file_size: u64, processing_time_secs: f64) -> f64 {
    let mut confidence: f64 = 0.8;

    // Thresholds are in characters, not bytes; accented transcripts must
    // not cross them early.
    let chars = text.chars().count();
    if chars > 50 {
        confidence += 0.1;
    } else if chars < 10 {
        confidence -= 0.2;
    }

    if file_size > 1024 * 1024 {
        confidence += 0.05;
    }

    if processing_time_secs < 5.0 {
        confidence += 0.05;
    }

    confidence.clamp(0.0, 1.0)
}

/// Estimate a clip's duration from its byte size and the format's nominal
/// bitrate. Reporting only; the duration cap was enforced on the declared
/// value before download.
pub fn estimate_duration_secs(file_size: u64, format: AudioFormat) -> f64 {
    const CONTAINER_OVERHEAD_FACTOR: f64 = 0.9;

    let bits = file_size as f64 * 8.0;
    let bits_per_sec = format.nominal_bitrate_kbps() as f64 * 1000.0;
    (bits / bits_per_sec) * CONTAINER_OVERHEAD_FACTOR
}
