mod audio_queue;
mod confirmation_store;
mod downloader;
mod intake;
mod janitor;
mod rate_limiter;
mod status_board;
mod transcriber;
mod validator;

pub use audio_queue::{AudioQueueManager, QueueError, MAX_QUEUE_SIZE};
pub use confirmation_store::{
    PendingConfirmationStore, DEFAULT_TTL, SWEEP_INTERVAL as CONFIRMATION_SWEEP_INTERVAL,
};
pub use downloader::{AudioDownloader, DownloadError};
pub use intake::{ConfirmError, IntakeError, IntakeStats, VoiceIntakeService};
pub use janitor::{TempFileJanitor, MAX_TEMP_FILE_AGE, SWEEP_INTERVAL as JANITOR_SWEEP_INTERVAL};
pub use rate_limiter::{SlidingWindowLimiter, MAX_REQUESTS_PER_WINDOW, WINDOW};
pub use status_board::StatusBoard;
pub use transcriber::{
    confidence_score, estimate_duration_secs, TranscribeError, Transcriber, BASE_RETRY_DELAY,
    MAX_ATTEMPTS,
};
pub use validator::{
    AudioValidator, ValidationError, MAX_DURATION_SECS, MAX_FILE_SIZE_BYTES, MIN_FREE_SPACE_BYTES,
};
