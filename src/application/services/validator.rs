use std::sync::Arc;

use crate::application::ports::ClipStorage;
use crate::domain::{AudioDescriptor, AudioFormat};

pub const MAX_FILE_SIZE_BYTES: u64 = 25 * 1024 * 1024;
pub const MAX_DURATION_SECS: u32 = 600;
pub const MIN_FREE_SPACE_BYTES: u64 = 1024 * 1024 * 1024;

/// Bytes per second below which a clip is implausibly small for its
/// declared duration. Logged, never rejected.
const MIN_PLAUSIBLE_BYTES_PER_SEC: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File handle is empty. Please resend the audio message.")]
    EmptyFileHandle,
    #[error("Declared file size is invalid. Please resend the audio message.")]
    InvalidSize,
    #[error(
        "Audio file is too large ({actual_mb:.1}MB). The limit is {limit_mb}MB; \
         try splitting the recording into shorter parts."
    )]
    SizeExceeded { actual_mb: f64, limit_mb: u64 },
    #[error("Declared duration is invalid. Make sure the audio is not empty.")]
    InvalidDuration,
    #[error(
        "Audio is too long ({actual_min:.1} min). The limit is {limit_min} minutes; \
         try recording a shorter message."
    )]
    DurationExceeded { actual_min: f64, limit_min: u32 },
    #[error("Unsupported format: {mime_type}. Accepted formats: {accepted}.")]
    UnsupportedFormat { mime_type: String, accepted: String },
    #[error("Insufficient storage on the server. Please try again later.")]
    InsufficientStorage,
}

/// Static checks on an incoming descriptor before any I/O.
///
/// Checks run in a fixed order and short-circuit on the first failure.
/// The only probe that touches the environment is the free-space floor,
/// and it fails open when free space cannot be determined.
pub struct AudioValidator {
    storage: Arc<dyn ClipStorage>,
    max_file_size: u64,
    max_duration_secs: u32,
    min_free_space: u64,
}

impl AudioValidator {
    pub fn new(storage: Arc<dyn ClipStorage>) -> Self {
        Self {
            storage,
            max_file_size: MAX_FILE_SIZE_BYTES,
            max_duration_secs: MAX_DURATION_SECS,
            min_free_space: MIN_FREE_SPACE_BYTES,
        }
    }

    pub fn with_limits(
        storage: Arc<dyn ClipStorage>,
        max_file_size: u64,
        max_duration_secs: u32,
        min_free_space: u64,
    ) -> Self {
        Self {
            storage,
            max_file_size,
            max_duration_secs,
            min_free_space,
        }
    }

    pub fn validate(&self, descriptor: &AudioDescriptor) -> Result<(), ValidationError> {
        if descriptor.file_id.is_empty() {
            return Err(ValidationError::EmptyFileHandle);
        }

        if descriptor.file_size == 0 {
            return Err(ValidationError::InvalidSize);
        }
        if descriptor.file_size > self.max_file_size {
            return Err(ValidationError::SizeExceeded {
                actual_mb: descriptor.file_size as f64 / (1024.0 * 1024.0),
                limit_mb: self.max_file_size / (1024 * 1024),
            });
        }

        if descriptor.duration_secs == 0 {
            return Err(ValidationError::InvalidDuration);
        }
        if descriptor.duration_secs > self.max_duration_secs {
            return Err(ValidationError::DurationExceeded {
                actual_min: descriptor.duration_secs as f64 / 60.0,
                limit_min: self.max_duration_secs / 60,
            });
        }

        if AudioFormat::from_mime(&descriptor.mime_type).is_none() {
            return Err(ValidationError::UnsupportedFormat {
                mime_type: descriptor.mime_type.clone(),
                accepted: AudioFormat::SUPPORTED_MIME_TYPES.join(", "),
            });
        }

        // Fails open: an unknown free-space reading never blocks intake.
        if let Some(free) = self.storage.available_space() {
            if free < self.min_free_space {
                return Err(ValidationError::InsufficientStorage);
            }
        }

        let min_expected_size = descriptor.duration_secs as u64 * MIN_PLAUSIBLE_BYTES_PER_SEC;
        if descriptor.file_size < min_expected_size {
            tracing::warn!(
                file_id = %descriptor.file_id,
                file_size = descriptor.file_size,
                duration_secs = descriptor.duration_secs,
                "Clip is implausibly small for its declared duration"
            );
        }

        Ok(())
    }
}
