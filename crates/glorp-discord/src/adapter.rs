use std::future::Future;
use std::sync::Arc;

use serenity::model::gateway::GatewayIntents;
use serenity::Client;
use tokio::sync::watch;
use tracing::{error, info};

use glorp_core::Backoff;

use crate::error::DiscordError;
use crate::handler::GlorpHandler;

/// Discord channel adapter.
///
/// Builds a serenity `Client` per connection attempt and drives its event loop
/// until shutdown or until the attempts run out.
pub struct DiscordAdapter {
    token: String,
    handler: GlorpHandler,
    backoff: Backoff,
}

impl DiscordAdapter {
    pub fn new(token: &str, handler: GlorpHandler, backoff: Backoff) -> Self {
        Self {
            token: token.to_string(),
            handler,
            backoff,
        }
    }

    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_MESSAGE_REACTIONS
    }

    /// Connect and run until `shutdown` flips or the gateway stops cleanly.
    ///
    /// A failed connection is retried on the backoff schedule; when every
    /// attempt failed the error is returned so the process can exit non-zero.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<(), DiscordError> {
        let attempts = self.backoff.max_attempts;
        with_backoff(self.backoff, shutdown.clone(), |attempt| {
            let shutdown = shutdown.clone();
            async move {
                info!(attempt = attempt + 1, "Discord: gateway connecting");
                self.connect_once(shutdown).await
            }
        })
        .await
        .map_err(|e| {
            error!(error = %e, attempts, "Discord: max reconnect attempts reached");
            DiscordError::ConnectExhausted { attempts }
        })
    }

    async fn connect_once(
        &self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), serenity::Error> {
        let mut client = Client::builder(&self.token, Self::intents())
            .event_handler(self.handler.clone())
            .await?;
        let shard_manager = Arc::clone(&client.shard_manager);

        tokio::select! {
            result = client.start() => {
                result?;
                info!("Discord: gateway stopped cleanly");
            }
            _ = wait_for_shutdown(&mut shutdown) => {
                info!("Discord: shutting down shards");
                shard_manager.shutdown_all().await;
            }
        }
        Ok(())
    }
}

/// Resolve once `shutdown` is true. Never resolves if the sender is gone
/// without having signalled.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Run `op` until it succeeds, sleeping `backoff.delay(n)` after the n-th
/// failure. Gives up with the last error after `backoff.max_attempts` tries.
/// A shutdown signal during a sleep ends the loop successfully.
async fn with_backoff<F, Fut, E>(
    backoff: Backoff,
    mut shutdown: watch::Receiver<bool>,
    mut op: F,
) -> Result<(), E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let mut last_err = None;
    for attempt in 0..backoff.max_attempts {
        match op(attempt).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                let delay = backoff.delay(attempt);
                error!(
                    attempt = attempt + 1,
                    error = %e,
                    retry_in_secs = delay.as_secs(),
                    "Discord: connection attempt failed"
                );
                last_err = Some(e);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = wait_for_shutdown(&mut shutdown) => return Ok(()),
                }
            }
        }
    }
    match last_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
