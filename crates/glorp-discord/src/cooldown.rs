//! Per-user cooldown for insult comebacks.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

pub const COOLDOWN: Duration = Duration::from_secs(600);
pub const MAX_COOLDOWNS: usize = 1000;

/// Bounded map of user id to the instant of their last triggered response.
pub struct CooldownTracker {
    entries: Mutex<HashMap<u64, Instant>>,
    cooldown: Duration,
    capacity: usize,
}

impl Default for CooldownTracker {
    fn default() -> Self {
        Self::new(COOLDOWN, MAX_COOLDOWNS)
    }
}

impl CooldownTracker {
    pub fn new(cooldown: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            cooldown,
            capacity: capacity.max(1),
        }
    }

    /// True while `user_id` triggered less than the cooldown ago.
    pub fn is_cooling_down(&self, user_id: u64, now: Instant) -> bool {
        self.lock()
            .get(&user_id)
            .is_some_and(|last| now.saturating_duration_since(*last) < self.cooldown)
    }

    /// Record a trigger. Expired entries go first, then the oldest entry if
    /// the map is still full.
    pub fn record(&self, user_id: u64, now: Instant) {
        let mut entries = self.lock();
        entries.retain(|_, last| now.saturating_duration_since(*last) <= self.cooldown);

        if !entries.contains_key(&user_id) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, last)| **last)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                debug!(user_id = oldest, "evicted oldest cooldown");
            }
        }

        entries.insert(user_id, now);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Instant>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
