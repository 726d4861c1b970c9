use async_trait::async_trait;

use crate::domain::PendingTranscription;

/// Delivery of the "transcription expired, please resend" message.
///
/// Invoked by the expiry sweep with the full entry before it is removed.
/// Best-effort: a failed notification is logged and never stops the sweep.
#[async_trait]
pub trait ExpiryNotifier: Send + Sync {
    async fn notify_expired(&self, transcription: &PendingTranscription);
}
