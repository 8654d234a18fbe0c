//! Outbound chat operations, abstracted so rules and the reaction worker can
//! run against a recording mock in tests.

use std::time::Duration;

use async_trait::async_trait;

use glorp_core::types::HistoricalMessage;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// HTTP 429. `retry_after` is set when the platform said how long to wait.
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("{0}")]
    Other(String),
}

/// Everything the bot does to a chat platform.
///
/// Ids are raw snowflakes. Sends return the id of the created message.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn send_text(&self, channel_id: u64, text: &str) -> Result<u64, GatewayError>;

    /// Send `text` as a reply referencing `message_id`.
    async fn reply(
        &self,
        channel_id: u64,
        message_id: u64,
        text: &str,
    ) -> Result<u64, GatewayError>;

    async fn add_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> Result<(), GatewayError>;

    /// Show the typing indicator. Platforms expire it on their own.
    async fn typing(&self, channel_id: u64) -> Result<(), GatewayError>;

    /// Up to `limit` messages posted before `before`, oldest first.
    async fn fetch_recent(
        &self,
        channel_id: u64,
        before: u64,
        limit: u8,
    ) -> Result<Vec<HistoricalMessage>, GatewayError>;
}
