use async_trait::async_trait;

use crate::domain::{ChatId, PlatformMessageId, TranscriptionId, UserId};

/// Prompt sent to the chat surface asking the user to confirm a transcript.
///
/// The two tokens are routed back verbatim when the user taps a button and
/// resolved against the pending-confirmation store.
#[derive(Debug, Clone)]
pub struct ConfirmationRequest {
    pub transcription_id: TranscriptionId,
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub reply_to: PlatformMessageId,
    pub transcribed_text: String,
    pub confirm_token: String,
    pub reject_token: String,
}

#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn request_confirmation(&self, request: &ConfirmationRequest) -> Result<(), PromptError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("failed to deliver confirmation prompt: {0}")]
    DeliveryFailed(String),
}
