use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::application::ports::ExpiryNotifier;
use crate::domain::{PendingTranscription, PlatformMessageId, TranscriptionId, UserId};

pub const DEFAULT_TTL: chrono::Duration = chrono::Duration::minutes(5);
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Transcribed-but-unconfirmed results, keyed by an opaque id.
///
/// Each entry lives at most once: confirm, reject, or expiry removes it,
/// whichever comes first. Foreground lazy expiry and the background sweep
/// are both idempotent on delete.
pub struct PendingConfirmationStore {
    pending: Mutex<HashMap<TranscriptionId, PendingTranscription>>,
    ttl: chrono::Duration,
}

impl PendingConfirmationStore {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: chrono::Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Store a transcript awaiting confirmation; returns its opaque id.
    pub fn add(
        &self,
        user_id: UserId,
        message_id: PlatformMessageId,
        transcribed_text: String,
    ) -> TranscriptionId {
        let entry =
            PendingTranscription::with_ttl(user_id, message_id, transcribed_text, self.ttl);
        let id = entry.id;
        self.lock().insert(id, entry);
        tracing::debug!(transcription_id = %id, user_id = %user_id, "Pending confirmation stored");
        id
    }

    /// Fetch an entry if present and not yet expired. An expired entry is
    /// deleted lazily and reported as absent.
    pub fn get(&self, id: &TranscriptionId) -> Option<PendingTranscription> {
        let mut pending = self.lock();
        match pending.get(id) {
            Some(entry) if entry.is_expired_at(Utc::now()) => {
                pending.remove(id);
                None
            }
            Some(entry) => Some(entry.clone()),
            None => None,
        }
    }

    /// Fetch and delete an entry under one lock, so exactly one caller can
    /// ever act on it. An expired entry is deleted and reported as absent.
    pub fn claim(&self, id: &TranscriptionId) -> Option<PendingTranscription> {
        let entry = self.lock().remove(id)?;
        if entry.is_expired_at(Utc::now()) {
            return None;
        }
        Some(entry)
    }

    /// Explicit deletion on reject. Removing an absent id is a no-op;
    /// returns whether an entry was actually removed.
    pub fn remove(&self, id: &TranscriptionId) -> bool {
        self.lock().remove(id).is_some()
    }

    /// All live entries belonging to one user.
    pub fn pending_for_user(&self, user_id: UserId) -> Vec<PendingTranscription> {
        let now = Utc::now();
        self.lock()
            .values()
            .filter(|t| t.user_id == user_id && !t.is_expired_at(now))
            .cloned()
            .collect()
    }

    /// Drop every entry for one user, live or expired.
    pub fn purge_user(&self, user_id: UserId) -> usize {
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|_, t| t.user_id != user_id);
        before - pending.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// One sweep pass: notify the caller about each expired entry, then
    /// delete it. A notification failure is the notifier's to log; it never
    /// stops the sweep. Returns how many entries were removed.
    pub async fn sweep_expired(&self, notifier: &dyn ExpiryNotifier) -> usize {
        let now = Utc::now();
        let expired: Vec<PendingTranscription> = self
            .lock()
            .values()
            .filter(|t| t.is_expired_at(now))
            .cloned()
            .collect();

        let mut removed = 0;
        for entry in expired {
            notifier.notify_expired(&entry).await;
            if self.remove(&entry.id) {
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Expiry sweep removed pending confirmations");
        }
        removed
    }

    /// Long-lived background sweep on a fixed interval. Runs until the
    /// returned handle is aborted at shutdown.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        notifier: Arc<dyn ExpiryNotifier>,
        interval: Duration,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            tracing::info!(interval_secs = interval.as_secs(), "Confirmation sweeper started");
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.sweep_expired(notifier.as_ref()).await;
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TranscriptionId, PendingTranscription>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for PendingConfirmationStore {
    fn default() -> Self {
        Self::new()
    }
}
