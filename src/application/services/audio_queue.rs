use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::Instrument;

use crate::domain::{AudioDescriptor, FileHandleId, ProcessingStatus, UserId};

use super::StatusBoard;

pub const MAX_QUEUE_SIZE: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error(
        "Processing queue is full ({current}/{capacity}). \
         Wait for your previous audio messages to finish."
    )]
    Full { current: usize, capacity: usize },
}

/// Bounded FIFO of clips per user.
///
/// Map accesses are short critical sections; the per-user drain mutex is
/// the exclusive section that serializes processing, so one user's clips
/// run strictly in arrival order while unrelated users interleave freely.
pub struct AudioQueueManager {
    queues: Mutex<HashMap<UserId, VecDeque<AudioDescriptor>>>,
    drains: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
    statuses: Arc<StatusBoard>,
    capacity: usize,
}

impl AudioQueueManager {
    pub fn new(statuses: Arc<StatusBoard>) -> Self {
        Self::with_capacity(statuses, MAX_QUEUE_SIZE)
    }

    pub fn with_capacity(statuses: Arc<StatusBoard>, capacity: usize) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            drains: Mutex::new(HashMap::new()),
            statuses,
            capacity,
        }
    }

    /// Append a clip to its owner's queue, returning the 0-based position.
    pub fn enqueue(&self, descriptor: AudioDescriptor) -> Result<usize, QueueError> {
        let user_id = descriptor.user_id;
        let mut queues = lock(&self.queues);
        let queue = queues.entry(user_id).or_default();

        if queue.len() >= self.capacity {
            return Err(QueueError::Full {
                current: queue.len(),
                capacity: self.capacity,
            });
        }

        queue.push_back(descriptor);
        let position = queue.len() - 1;
        tracing::info!(user_id = %user_id, position, "Clip enqueued");
        Ok(position)
    }

    /// Current position of a clip in its owner's queue, if still queued.
    pub fn position(&self, user_id: UserId, file_id: &FileHandleId) -> Option<usize> {
        lock(&self.queues)
            .get(&user_id)?
            .iter()
            .position(|d| &d.file_id == file_id)
    }

    /// Process the user's queue to exhaustion, one clip at a time.
    ///
    /// A failing clip is marked Failed and the drain continues with the
    /// rest; it never aborts the user's remaining queue.
    pub async fn drain<F, Fut, E>(&self, user_id: UserId, mut process: F)
    where
        F: FnMut(AudioDescriptor) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: fmt::Display,
    {
        let drain_lock = {
            let mut drains = lock(&self.drains);
            Arc::clone(drains.entry(user_id).or_default())
        };
        let _guard = drain_lock.lock().await;

        while let Some(descriptor) = self.pop_front(user_id) {
            let file_id = descriptor.file_id.clone();
            let span = tracing::info_span!(
                "clip_processing",
                user_id = %user_id,
                file_id = %file_id,
            );

            if let Err(e) = process(descriptor).instrument(span).await {
                tracing::error!(error = %e, "Clip processing failed; continuing drain");
                self.statuses.set(&file_id, ProcessingStatus::Failed);
            }
        }

        drop(_guard);
        self.evict_idle_drain(user_id, &drain_lock);
    }

    pub fn queued_for_user(&self, user_id: UserId) -> usize {
        lock(&self.queues).get(&user_id).map_or(0, VecDeque::len)
    }

    pub fn queued_total(&self) -> usize {
        lock(&self.queues).values().map(VecDeque::len).sum()
    }

    pub fn active_users(&self) -> usize {
        lock(&self.queues).len()
    }

    pub fn clear(&self) {
        lock(&self.queues).clear();
        lock(&self.drains).clear();
    }

    fn pop_front(&self, user_id: UserId) -> Option<AudioDescriptor> {
        let mut queues = lock(&self.queues);
        let queue = queues.get_mut(&user_id)?;
        let descriptor = queue.pop_front();
        // Empty queues are evicted so churned users do not leak map entries.
        if queue.is_empty() {
            queues.remove(&user_id);
        }
        descriptor
    }

    fn evict_idle_drain(&self, user_id: UserId, held: &Arc<tokio::sync::Mutex<()>>) {
        let mut drains = lock(&self.drains);
        if let Some(stored) = drains.get(&user_id) {
            // Ours plus the map's copy; anything more means another drain
            // is waiting on this lock.
            if Arc::ptr_eq(stored, held) && Arc::strong_count(stored) == 2 {
                drains.remove(&user_id);
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
