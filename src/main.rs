use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use contavoz::application::ports::{
    ClipStorage, ConfirmationPrompt, ConfirmationRequest, ExpenseRecorder, ExpenseRecorderError,
    ExpiryNotifier, PromptError, SpeechToText,
};
use contavoz::application::services::{
    AudioDownloader, AudioQueueManager, AudioValidator, PendingConfirmationStore,
    SlidingWindowLimiter, StatusBoard, TempFileJanitor, Transcriber, VoiceIntakeService,
};
use contavoz::config::{Environment, Settings};
use contavoz::domain::{PendingTranscription, UserId};
use contavoz::infrastructure::observability::{init_tracing, TracingConfig};
use contavoz::infrastructure::platform::TelegramMediaGateway;
use contavoz::infrastructure::speech::OpenAiSpeechClient;
use contavoz::infrastructure::storage::TempFileStore;

// The chat-command surface is a separate collaborator; these stubs stand in
// for its prompt delivery and expense persistence until it is wired up.
struct LogOnlyPrompt;

#[async_trait]
impl ConfirmationPrompt for LogOnlyPrompt {
    async fn request_confirmation(&self, request: &ConfirmationRequest) -> Result<(), PromptError> {
        tracing::info!(
            transcription_id = %request.transcription_id,
            chat_id = %request.chat_id,
            text = %request.transcribed_text,
            confirm_token = %request.confirm_token,
            reject_token = %request.reject_token,
            "Confirmation prompt requested"
        );
        Ok(())
    }
}

struct LogOnlyRecorder;

#[async_trait]
impl ExpenseRecorder for LogOnlyRecorder {
    async fn record_expense(
        &self,
        user_id: UserId,
        transcription: &PendingTranscription,
    ) -> Result<(), ExpenseRecorderError> {
        tracing::info!(
            user_id = %user_id,
            text = %transcription.transcribed_text,
            "Expense recording requested"
        );
        Ok(())
    }
}

struct LogOnlyExpiryNotifier;

#[async_trait]
impl ExpiryNotifier for LogOnlyExpiryNotifier {
    async fn notify_expired(&self, transcription: &PendingTranscription) {
        tracing::info!(
            transcription_id = %transcription.id,
            user_id = %transcription.user_id,
            "Pending transcription expired"
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to parse APP_ENVIRONMENT: {}", e))?;
    let settings = Settings::load(environment)?;

    init_tracing(TracingConfig::from_settings(
        environment.as_str(),
        &settings.logging,
    ));
    tracing::info!(environment = %environment, "Voice intake starting");

    let storage: Arc<dyn ClipStorage> = Arc::new(
        TempFileStore::new(PathBuf::from(&settings.audio.temp_dir))
            .map_err(|e| anyhow::anyhow!("Failed to prepare temp directory: {}", e))?,
    );
    let gateway = Arc::new(TelegramMediaGateway::new(
        settings.telegram.bot_token.clone(),
        settings.telegram.api_base.clone(),
    ));
    let speech: Arc<dyn SpeechToText> = Arc::new(OpenAiSpeechClient::new(
        settings.speech.api_key.clone(),
        settings.speech.base_url.clone(),
        Some(settings.speech.model.clone()),
    ));

    let statuses = Arc::new(StatusBoard::new());
    let validator = AudioValidator::with_limits(
        Arc::clone(&storage),
        settings.audio.max_file_size_mb * 1024 * 1024,
        settings.audio.max_duration_secs,
        settings.audio.min_free_space_gb * 1024 * 1024 * 1024,
    );
    let rate_limiter = SlidingWindowLimiter::with_limits(
        settings.audio.requests_per_minute,
        Duration::from_secs(60),
    );
    let queues =
        AudioQueueManager::with_capacity(Arc::clone(&statuses), settings.audio.max_queue_size);
    let downloader = AudioDownloader::new(gateway, Arc::clone(&storage), Arc::clone(&statuses));
    let transcriber = Transcriber::new(
        speech,
        Arc::clone(&storage),
        Arc::clone(&statuses),
        settings.speech.language.clone(),
    );
    let confirmations = Arc::new(PendingConfirmationStore::with_ttl(
        chrono::Duration::minutes(settings.confirmation.ttl_minutes),
    ));
    let janitor = Arc::new(TempFileJanitor::with_max_age(
        Arc::clone(&storage),
        Duration::from_secs(settings.janitor.max_age_secs),
    ));

    let intake = Arc::new(VoiceIntakeService::new(
        validator,
        rate_limiter,
        queues,
        statuses,
        downloader,
        transcriber,
        confirmations,
        janitor,
        storage,
        Arc::new(LogOnlyPrompt),
        Arc::new(LogOnlyRecorder),
    ));

    intake.start_background_tasks(
        Arc::new(LogOnlyExpiryNotifier),
        Duration::from_secs(settings.confirmation.sweep_interval_secs),
        Duration::from_secs(settings.janitor.interval_secs),
    );

    tracing::info!("Voice intake running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    intake.shutdown().await;
    Ok(())
}
