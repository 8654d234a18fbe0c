//! Outbound reaction queue.
//!
//! Producers push jobs from any task; one worker drains them in FIFO order,
//! paced and bounded so a burst of reactions cannot trip the platform's rate
//! limit. A rate-limited job goes back to the front of the queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{watch, Notify, Semaphore};
use tracing::{debug, info, warn};

use crate::gateway::{Gateway, GatewayError};

pub const MAX_CONCURRENT_REACTIONS: usize = 5;
/// Pause after every successful reaction.
pub const PACING: Duration = Duration::from_millis(500);
/// Wait after a 429 that did not say how long to back off.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);
/// Idle wake-up interval; a missed notification costs at most this long.
pub const IDLE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionJob {
    pub channel_id: u64,
    pub message_id: u64,
    pub emoji: String,
}

impl ReactionJob {
    pub fn new(channel_id: u64, message_id: u64, emoji: impl Into<String>) -> Self {
        Self {
            channel_id,
            message_id,
            emoji: emoji.into(),
        }
    }
}

/// Unbounded multi-producer queue with a single consumer.
pub struct ReactionQueue {
    jobs: Mutex<VecDeque<ReactionJob>>,
    notify: Notify,
    permits: Semaphore,
}

impl Default for ReactionQueue {
    fn default() -> Self {
        Self::new(MAX_CONCURRENT_REACTIONS)
    }
}

impl ReactionQueue {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            permits: Semaphore::new(max_concurrent.max(1)),
        }
    }

    pub fn enqueue(&self, job: ReactionJob) {
        debug!(message_id = job.message_id, emoji = %job.emoji, "queued reaction");
        self.lock().push_back(job);
        self.notify.notify_one();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pop(&self) -> Option<ReactionJob> {
        self.lock().pop_front()
    }

    fn push_front(&self, job: ReactionJob) {
        self.lock().push_front(job);
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ReactionJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drain the queue until `shutdown` flips to true.
    ///
    /// Jobs left in the queue at shutdown are dropped.
    pub async fn run_worker(
        self: Arc<Self>,
        gateway: Arc<dyn Gateway>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("reaction worker started");
        loop {
            let Some(job) = self.pop() else {
                tokio::select! {
                    _ = self.notify.notified() => {}
                    _ = tokio::time::sleep(IDLE_POLL) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
                continue;
            };

            if *shutdown.borrow() {
                break;
            }
            self.process(gateway.as_ref(), job).await;
        }
        info!(pending = self.len(), "reaction worker stopped");
    }

    async fn process(&self, gateway: &dyn Gateway, job: ReactionJob) {
        let Ok(_permit) = self.permits.acquire().await else {
            return;
        };

        match gateway
            .add_reaction(job.channel_id, job.message_id, &job.emoji)
            .await
        {
            Ok(()) => {
                debug!(message_id = job.message_id, emoji = %job.emoji, "added reaction");
                tokio::time::sleep(PACING).await;
            }
            Err(GatewayError::RateLimited { retry_after }) => {
                let wait = retry_after.unwrap_or(DEFAULT_RETRY_AFTER);
                warn!(
                    message_id = job.message_id,
                    retry_after_ms = wait.as_millis() as u64,
                    "rate limited adding reaction, retrying"
                );
                self.push_front(job);
                tokio::time::sleep(wait).await;
            }
            Err(e) => {
                warn!(
                    message_id = job.message_id,
                    emoji = %job.emoji,
                    error = %e,
                    "failed to add reaction, dropping"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockGateway;
    use tokio::time::Instant;

    fn job(message_id: u64) -> ReactionJob {
        ReactionJob::new(1, message_id, "👽")
    }

    async fn drain(queue: Arc<ReactionQueue>, gateway: Arc<MockGateway>, expected_calls: usize) {
        let (tx, rx) = watch::channel(false);
        let worker = tokio::spawn(Arc::clone(&queue).run_worker(gateway.clone(), rx));
        while gateway.reactions().len() < expected_calls || !queue.is_empty() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tx.send(true).unwrap();
        worker.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_job_is_retried_before_later_jobs() {
        let queue = Arc::new(ReactionQueue::default());
        let gateway = Arc::new(MockGateway::new());
        gateway.script_reaction(Err(GatewayError::RateLimited { retry_after: None }));

        for id in [1, 2, 3] {
            queue.enqueue(job(id));
        }
        drain(Arc::clone(&queue), Arc::clone(&gateway), 4).await;

        let order: Vec<u64> = gateway.reactions().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![1, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn other_failures_drop_the_job() {
        let queue = Arc::new(ReactionQueue::default());
        let gateway = Arc::new(MockGateway::new());
        gateway.script_reaction(Err(GatewayError::Other("unknown message".to_string())));

        queue.enqueue(job(1));
        queue.enqueue(job(2));
        drain(Arc::clone(&queue), Arc::clone(&gateway), 2).await;

        let order: Vec<u64> = gateway.reactions().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn honours_retry_after() {
        let queue = Arc::new(ReactionQueue::default());
        let gateway = Arc::new(MockGateway::new());
        gateway.script_reaction(Err(GatewayError::RateLimited {
            retry_after: Some(Duration::from_secs(3)),
        }));
        queue.enqueue(job(1));

        let (tx, rx) = watch::channel(false);
        let started = Instant::now();
        let worker = tokio::spawn(Arc::clone(&queue).run_worker(gateway.clone(), rx));

        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(gateway.reactions().len(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(gateway.reactions().len(), 2);
        assert!(started.elapsed() >= Duration::from_secs(3));

        tx.send(true).unwrap();
        worker.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn worker_stops_on_shutdown() {
        let queue = Arc::new(ReactionQueue::default());
        let gateway = Arc::new(MockGateway::new());
        let (tx, rx) = watch::channel(false);
        let worker = tokio::spawn(Arc::clone(&queue).run_worker(gateway, rx));

        tx.send(true).unwrap();
        worker.await.unwrap();
    }
}
