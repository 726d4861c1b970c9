use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::UserId;

pub const MAX_REQUESTS_PER_WINDOW: usize = 5;
pub const WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window request counter, one window per user.
///
/// Availability is preferred over strict enforcement: a poisoned lock is
/// recovered and the check proceeds, so the limiter fails open rather
/// than rejecting traffic on an internal error.
pub struct SlidingWindowLimiter {
    requests: Mutex<HashMap<UserId, Vec<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self::with_limits(MAX_REQUESTS_PER_WINDOW, WINDOW)
    }

    pub fn with_limits(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Record the request if the user is under the cap; `false` rejects.
    pub fn allow(&self, user_id: UserId) -> bool {
        let now = Instant::now();
        let mut requests = match self.requests.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let timestamps = requests.entry(user_id).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            tracing::warn!(
                user_id = %user_id,
                current = timestamps.len(),
                max = self.max_requests,
                "Rate limit exceeded"
            );
            return false;
        }

        timestamps.push(now);
        true
    }

    /// Drop a user's window once it is empty, so churned users do not
    /// accumulate map entries forever.
    pub fn evict_idle(&self) {
        let now = Instant::now();
        let mut requests = match self.requests.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        requests.retain(|_, timestamps| {
            timestamps.retain(|t| now.duration_since(*t) < self.window);
            !timestamps.is_empty()
        });
    }

    pub fn tracked_users(&self) -> usize {
        match self.requests.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn clear(&self) {
        match self.requests.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}
