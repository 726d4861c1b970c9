use async_trait::async_trait;

use crate::domain::{PendingTranscription, UserId};

/// Downstream interpretation and persistence of a confirmed transcript.
///
/// Categorization, spreadsheet mirroring, and relational persistence all
/// live behind this port; the intake core treats them as one opaque call.
#[async_trait]
pub trait ExpenseRecorder: Send + Sync {
    async fn record_expense(
        &self,
        user_id: UserId,
        transcription: &PendingTranscription,
    ) -> Result<(), ExpenseRecorderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExpenseRecorderError {
    #[error("expense interpretation failed: {0}")]
    InterpretationFailed(String),
    #[error("expense persistence failed: {0}")]
    PersistenceFailed(String),
}
