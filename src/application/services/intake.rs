use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{
    ClipStorage, ConfirmationPrompt, ConfirmationRequest, ExpenseRecorder, ExpenseRecorderError,
    ExpiryNotifier, PromptError,
};
use crate::domain::{
    AudioDescriptor, ConfirmationAction, FileHandleId, PendingTranscription, ProcessingStatus,
    TranscriptionId, UserId,
};

use super::audio_queue::QueueError;
use super::downloader::DownloadError;
use super::transcriber::TranscribeError;
use super::validator::ValidationError;
use super::{
    AudioDownloader, AudioQueueManager, AudioValidator, PendingConfirmationStore,
    SlidingWindowLimiter, StatusBoard, TempFileJanitor, Transcriber,
};

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Too many requests in the last minute. Please wait a moment and try again.")]
    RateLimited,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error(transparent)]
    Transcription(#[from] TranscribeError),
    #[error("Could not deliver the confirmation prompt. Please resend the audio message.")]
    Prompt(#[source] PromptError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfirmError {
    #[error("This transcription has expired or was already handled. Please resend the audio.")]
    NotFoundOrExpired,
    #[error("Could not record the expense: {0}. Please try again.")]
    Recorder(#[source] ExpenseRecorderError),
}

/// Point-in-time snapshot of the intake pipeline.
#[derive(Debug, Clone)]
pub struct IntakeStats {
    pub queued_clips: usize,
    pub active_users: usize,
    pub status_counts: HashMap<ProcessingStatus, usize>,
    pub pending_confirmations: usize,
    pub staged_files: usize,
}

/// End-to-end pipeline: rate limit → validate → enqueue → drain
/// (download → transcribe → confirmation prompt), then confirm or reject.
///
/// Constructed once at startup and shared by handle; no global state.
pub struct VoiceIntakeService {
    validator: AudioValidator,
    rate_limiter: SlidingWindowLimiter,
    queues: AudioQueueManager,
    statuses: Arc<StatusBoard>,
    downloader: AudioDownloader,
    transcriber: Transcriber,
    confirmations: Arc<PendingConfirmationStore>,
    janitor: Arc<TempFileJanitor>,
    storage: Arc<dyn ClipStorage>,
    prompt: Arc<dyn ConfirmationPrompt>,
    recorder: Arc<dyn ExpenseRecorder>,
    /// Which clip each pending confirmation came from, so confirm/reject
    /// can finish that clip's status transitions.
    clip_index: Mutex<HashMap<TranscriptionId, FileHandleId>>,
    background: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl VoiceIntakeService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        validator: AudioValidator,
        rate_limiter: SlidingWindowLimiter,
        queues: AudioQueueManager,
        statuses: Arc<StatusBoard>,
        downloader: AudioDownloader,
        transcriber: Transcriber,
        confirmations: Arc<PendingConfirmationStore>,
        janitor: Arc<TempFileJanitor>,
        storage: Arc<dyn ClipStorage>,
        prompt: Arc<dyn ConfirmationPrompt>,
        recorder: Arc<dyn ExpenseRecorder>,
    ) -> Self {
        Self {
            validator,
            rate_limiter,
            queues,
            statuses,
            downloader,
            transcriber,
            confirmations,
            janitor,
            storage,
            prompt,
            recorder,
            clip_index: Mutex::new(HashMap::new()),
            background: Mutex::new(Vec::new()),
        }
    }

    /// Start the two long-lived background tasks: the confirmation-expiry
    /// sweep and the temp-file janitor. Both are cancelled by `shutdown`.
    pub fn start_background_tasks(
        self: &Arc<Self>,
        notifier: Arc<dyn ExpiryNotifier>,
        sweep_interval: Duration,
        janitor_interval: Duration,
    ) {
        let bridge: Arc<dyn ExpiryNotifier> = Arc::new(ExpiryBridge {
            intake: Arc::clone(self),
            inner: notifier,
        });
        let sweeper = self.confirmations.spawn_sweeper(bridge, sweep_interval);
        let janitor = Arc::clone(&self.janitor).spawn(janitor_interval);

        let mut background = lock(&self.background);
        background.push(sweeper);
        background.push(janitor);
    }

    /// Admit a clip into its owner's queue. Returns the queue position.
    pub fn submit(&self, descriptor: AudioDescriptor) -> Result<usize, IntakeError> {
        if !self.rate_limiter.allow(descriptor.user_id) {
            return Err(IntakeError::RateLimited);
        }
        self.validator.validate(&descriptor)?;
        Ok(self.queues.enqueue(descriptor)?)
    }

    /// Process everything queued for one user, sequentially. Safe to call
    /// whenever clips may be waiting; concurrent calls for the same user
    /// serialize, different users run independently.
    pub async fn drain_user(&self, user_id: UserId) {
        self.queues
            .drain(user_id, |descriptor| self.process_clip(descriptor))
            .await;
        self.rate_limiter.evict_idle();
    }

    /// Resolve a routed-back confirmation token from the chat surface.
    pub async fn resolve_action(&self, token: &str) -> Option<Result<(), ConfirmError>> {
        let (action, id) = ConfirmationAction::parse(token)?;
        match action {
            ConfirmationAction::Confirm => Some(self.confirm(&id).await),
            ConfirmationAction::Reject => {
                self.reject(&id);
                Some(Ok(()))
            }
        }
    }

    /// Turn a confirmed transcription into a financial record.
    ///
    /// Claiming the entry deletes it in the same step, so a duplicated
    /// confirmation (chat platforms redeliver callbacks) records at most
    /// one expense; the loser sees `NotFoundOrExpired`.
    pub async fn confirm(&self, id: &TranscriptionId) -> Result<(), ConfirmError> {
        let entry = self
            .confirmations
            .claim(id)
            .ok_or(ConfirmError::NotFoundOrExpired)?;

        let file_id = self.take_clip(id);
        if let Some(file_id) = &file_id {
            self.statuses.set(file_id, ProcessingStatus::ProcessingExpense);
        }

        match self.recorder.record_expense(entry.user_id, &entry).await {
            Ok(()) => {
                if let Some(file_id) = &file_id {
                    self.statuses.set(file_id, ProcessingStatus::Completed);
                }
                tracing::info!(
                    transcription_id = %id,
                    user_id = %entry.user_id,
                    "Transcription confirmed and recorded"
                );
                Ok(())
            }
            Err(e) => {
                if let Some(file_id) = &file_id {
                    self.statuses.set(file_id, ProcessingStatus::Failed);
                }
                tracing::error!(transcription_id = %id, error = %e, "Expense recording failed");
                Err(ConfirmError::Recorder(e))
            }
        }
    }

    /// Discard a transcription the user rejected. Idempotent; rejecting an
    /// absent or expired id is a no-op.
    pub fn reject(&self, id: &TranscriptionId) {
        let removed = self.confirmations.remove(id);
        if let Some(file_id) = self.take_clip(id) {
            self.statuses.set(&file_id, ProcessingStatus::Rejected);
        }
        if removed {
            tracing::info!(transcription_id = %id, "Transcription rejected");
        }
    }

    pub async fn stats(&self) -> IntakeStats {
        IntakeStats {
            queued_clips: self.queues.queued_total(),
            active_users: self.queues.active_users(),
            status_counts: self.statuses.counts(),
            pending_confirmations: self.confirmations.len(),
            staged_files: self.storage.staged_file_count().await.unwrap_or(0),
        }
    }

    /// Cancel background tasks and discard all in-memory state. In-flight
    /// and awaiting-confirmation items do not survive a restart.
    pub async fn shutdown(&self) {
        let handles: Vec<_> = lock(&self.background).drain(..).collect();
        for handle in handles {
            handle.abort();
        }

        self.queues.clear();
        self.statuses.clear_all();
        self.confirmations.clear();
        self.rate_limiter.clear();
        lock(&self.clip_index).clear();

        if let Err(e) = self.janitor.sweep_all().await {
            tracing::warn!(error = %e, "Final temp sweep failed during shutdown");
        }
        tracing::info!("Voice intake service shut down");
    }

    async fn process_clip(&self, descriptor: AudioDescriptor) -> Result<(), IntakeError> {
        let path = self.downloader.download(&descriptor).await?;

        let transcript = self.transcriber.transcribe(&descriptor.file_id, &path).await;
        // The clip's bytes are never kept past the processing window.
        self.janitor.cleanup_one(&path).await;
        let transcript = transcript?;

        let id = self.confirmations.add(
            descriptor.user_id,
            descriptor.message_id,
            transcript.text.clone(),
        );
        lock(&self.clip_index).insert(id, descriptor.file_id.clone());
        self.statuses
            .set(&descriptor.file_id, ProcessingStatus::AwaitingConfirmation);

        let request = ConfirmationRequest {
            transcription_id: id,
            user_id: descriptor.user_id,
            chat_id: descriptor.chat_id,
            reply_to: descriptor.message_id,
            transcribed_text: transcript.text,
            confirm_token: ConfirmationAction::Confirm.token(id),
            reject_token: ConfirmationAction::Reject.token(id),
        };

        if let Err(e) = self.prompt.request_confirmation(&request).await {
            // Nobody can ever answer a prompt that was not delivered.
            self.confirmations.remove(&id);
            self.take_clip(&id);
            return Err(IntakeError::Prompt(e));
        }

        Ok(())
    }

    fn take_clip(&self, id: &TranscriptionId) -> Option<FileHandleId> {
        lock(&self.clip_index).remove(id)
    }

    fn on_expired(&self, transcription: &PendingTranscription) {
        // Absence from the store is authoritative for expiry; only the
        // bookkeeping entry needs dropping.
        if let Some(file_id) = self.take_clip(&transcription.id) {
            self.statuses.clear(&file_id);
        }
    }
}

/// Wraps the registered notifier so expiry also clears the intake
/// service's per-clip bookkeeping.
struct ExpiryBridge {
    intake: Arc<VoiceIntakeService>,
    inner: Arc<dyn ExpiryNotifier>,
}

#[async_trait]
impl ExpiryNotifier for ExpiryBridge {
    async fn notify_expired(&self, transcription: &PendingTranscription) {
        self.intake.on_expired(transcription);
        self.inner.notify_expired(transcription).await;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
