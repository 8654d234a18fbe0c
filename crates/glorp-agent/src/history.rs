//! Per-channel conversation history.
//!
//! Each channel keeps at most `max_turns` turns. Histories whose newest turn is
//! older than `max_age` are dropped by [`HistoryStore::prune`], which the
//! cleanup job runs periodically. Everything lives in memory only.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::info;

use crate::provider::{Message, Role};

pub const MAX_HISTORY: usize = 20;
pub const MAX_HISTORY_AGE: Duration = Duration::from_secs(3600);

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: Instant,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>, timestamp: Instant) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    pub fn to_message(&self) -> Message {
        Message::new(self.role, self.content.clone())
    }
}

/// Bounded, mutex-guarded map of channel id to ordered turns.
pub struct HistoryStore {
    channels: Mutex<HashMap<u64, Vec<ConversationTurn>>>,
    max_turns: usize,
    max_age: Duration,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(MAX_HISTORY, MAX_HISTORY_AGE)
    }
}

impl HistoryStore {
    pub fn new(max_turns: usize, max_age: Duration) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            max_turns,
            max_age,
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Snapshot of a channel's turns, oldest first. Empty when unknown.
    pub fn get(&self, channel_id: u64) -> Vec<ConversationTurn> {
        self.lock().get(&channel_id).cloned().unwrap_or_default()
    }

    /// Replace a channel's history, keeping only the newest `max_turns`.
    pub fn store(&self, channel_id: u64, mut turns: Vec<ConversationTurn>) {
        truncate_front(&mut turns, self.max_turns);
        self.lock().insert(channel_id, turns);
    }

    /// Store `prior` followed by a completed user/assistant exchange.
    pub fn record_exchange(
        &self,
        channel_id: u64,
        mut prior: Vec<ConversationTurn>,
        user_message: &str,
        reply: &str,
        now: Instant,
    ) {
        prior.push(ConversationTurn::new(Role::User, user_message, now));
        prior.push(ConversationTurn::new(Role::Assistant, reply, now));
        self.store(channel_id, prior);
    }

    /// Truncate every history and drop the ones idle for longer than `max_age`.
    ///
    /// Returns the ids of the dropped channels.
    pub fn prune(&self, now: Instant) -> Vec<u64> {
        let mut channels = self.lock();
        let mut expired = Vec::new();

        for (channel_id, turns) in channels.iter_mut() {
            truncate_front(turns, self.max_turns);
            let stale = turns
                .last()
                .map(|t| now.saturating_duration_since(t.timestamp) > self.max_age)
                .unwrap_or(true);
            if stale {
                expired.push(*channel_id);
            }
        }

        for channel_id in &expired {
            channels.remove(channel_id);
            info!(channel_id, "cleaned up conversation history");
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Prune every `interval` until `shutdown` flips to true.
    pub async fn run_cleanup(self: Arc<Self>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = interval.as_secs(), "history cleanup started");
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let dropped = self.prune(Instant::now());
                    info!(dropped = dropped.len(), remaining = self.len(), "history cleanup pass");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("history cleanup shutting down");
                        break;
                    }
                }
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Vec<ConversationTurn>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn truncate_front(turns: &mut Vec<ConversationTurn>, max: usize) {
    if turns.len() > max {
        turns.drain(..turns.len() - max);
    }
}
