use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::{FileHandleId, ProcessingStatus};

/// Current processing status per clip, keyed by file handle id.
///
/// Shared between the queue, downloader, transcriber, and intake services;
/// each transition overwrites the previous value.
#[derive(Default)]
pub struct StatusBoard {
    statuses: Mutex<HashMap<FileHandleId, ProcessingStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, file_id: &FileHandleId, status: ProcessingStatus) {
        tracing::debug!(file_id = %file_id, status = %status, "Clip status transition");
        self.lock().insert(file_id.clone(), status);
    }

    pub fn get(&self, file_id: &FileHandleId) -> Option<ProcessingStatus> {
        self.lock().get(file_id).copied()
    }

    /// Drop a clip's entry once its lifecycle is fully resolved.
    /// Removing an absent id is a no-op.
    pub fn clear(&self, file_id: &FileHandleId) {
        self.lock().remove(file_id);
    }

    /// Count of clips per status, for stats reporting.
    pub fn counts(&self) -> HashMap<ProcessingStatus, usize> {
        let mut counts = HashMap::new();
        for status in self.lock().values() {
            *counts.entry(*status).or_insert(0) += 1;
        }
        counts
    }

    pub fn clear_all(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<FileHandleId, ProcessingStatus>> {
        match self.statuses.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
