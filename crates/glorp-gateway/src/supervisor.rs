//! Keeps long-lived background jobs running.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Pause before restarting a job that died, so a job failing on start cannot spin.
pub const RESTART_DELAY: Duration = Duration::from_secs(1);

/// Owns the background jobs. A job that returns or panics before shutdown is
/// restarted after [`RESTART_DELAY`].
pub struct Supervisor {
    shutdown: watch::Receiver<bool>,
    jobs: Vec<(&'static str, JoinHandle<()>)>,
}

impl Supervisor {
    pub fn new(shutdown: watch::Receiver<bool>) -> Self {
        Self {
            shutdown,
            jobs: Vec::new(),
        }
    }

    /// Start `name`, calling `make` again for every restart.
    pub fn spawn<F, Fut>(&mut self, name: &'static str, make: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut shutdown = self.shutdown.clone();
        let handle = tokio::spawn(async move {
            let mut starts = 0u32;
            loop {
                starts += 1;
                info!(job = name, starts, "starting background job");
                let outcome = tokio::spawn(make()).await;

                if *shutdown.borrow() {
                    break;
                }
                match outcome {
                    Ok(()) => warn!(job = name, "background job exited unexpectedly, restarting"),
                    Err(e) => error!(job = name, error = %e, "background job panicked, restarting"),
                }

                tokio::select! {
                    _ = tokio::time::sleep(RESTART_DELAY) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!(job = name, "background job stopped");
        });
        self.jobs.push((name, handle));
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Wait for every job to wind down after shutdown was signalled.
    pub async fn join(self) {
        for (name, handle) in self.jobs {
            if let Err(e) = handle.await {
                error!(job = name, error = %e, "supervisor task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// A job that stops on shutdown, like the real ones.
    async fn until_shutdown(mut rx: watch::Receiver<bool>) {
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn restarts_jobs_that_die() {
        let (tx, rx) = watch::channel(false);
        let mut supervisor = Supervisor::new(rx.clone());
        let starts = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&starts);
        supervisor.spawn("flaky", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let rx = rx.clone();
            async move {
                match n {
                    0 => panic!("boom"),
                    1 => {}
                    _ => until_shutdown(rx).await,
                }
            }
        });

        tokio::time::sleep(RESTART_DELAY * 5).await;
        assert_eq!(starts.load(Ordering::SeqCst), 3);

        tx.send(true).unwrap();
        supervisor.join().await;
        assert_eq!(starts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn clean_exit_on_shutdown_is_not_restarted() {
        let (tx, rx) = watch::channel(false);
        let mut supervisor = Supervisor::new(rx.clone());
        let starts = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&starts);
        supervisor.spawn("steady", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            until_shutdown(rx.clone())
        });
        assert_eq!(supervisor.len(), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        tx.send(true).unwrap();
        supervisor.join().await;
        assert_eq!(starts.load(Ordering::SeqCst), 1);
    }
}
