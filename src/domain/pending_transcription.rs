use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::{PlatformMessageId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TranscriptionId(Uuid);

impl TranscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TranscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TranscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TranscriptionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A transcribed clip waiting for the user's confirmation.
///
/// Lives at most once: destroyed on confirm, on reject, or on expiry,
/// whichever happens first.
#[derive(Debug, Clone)]
pub struct PendingTranscription {
    pub id: TranscriptionId,
    pub user_id: UserId,
    pub message_id: PlatformMessageId,
    pub transcribed_text: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingTranscription {
    /// Create a pending entry expiring `ttl` after now.
    ///
    /// `ttl` must be positive so the expiry is strictly after creation.
    pub fn with_ttl(
        user_id: UserId,
        message_id: PlatformMessageId,
        transcribed_text: String,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TranscriptionId::new(),
            user_id,
            message_id,
            transcribed_text,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
