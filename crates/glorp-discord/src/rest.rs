use std::sync::Arc;

use async_trait::async_trait;
use serenity::builder::GetMessages;
use serenity::http::{Http, HttpError};
use serenity::model::channel::ReactionType;
use serenity::model::id::{ChannelId, MessageId};

use glorp_core::types::HistoricalMessage;

use crate::gateway::{Gateway, GatewayError};
use crate::send;

/// [`Gateway`] over serenity's REST client.
///
/// `Http` is independent of the gateway WebSocket, so one instance stays
/// valid across reconnects and can be shared by background jobs.
#[derive(Clone)]
pub struct SerenityGateway {
    http: Arc<Http>,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Gateway for SerenityGateway {
    async fn send_text(&self, channel_id: u64, text: &str) -> Result<u64, GatewayError> {
        let id = send::send_chunked(&self.http, ChannelId::new(channel_id), text, None)
            .await
            .map_err(map_error)?;
        Ok(id.get())
    }

    async fn reply(
        &self,
        channel_id: u64,
        message_id: u64,
        text: &str,
    ) -> Result<u64, GatewayError> {
        let id = send::send_chunked(
            &self.http,
            ChannelId::new(channel_id),
            text,
            Some(MessageId::new(message_id)),
        )
        .await
        .map_err(map_error)?;
        Ok(id.get())
    }

    async fn add_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> Result<(), GatewayError> {
        let reaction = ReactionType::Unicode(emoji.to_string());
        self.http
            .create_reaction(ChannelId::new(channel_id), MessageId::new(message_id), &reaction)
            .await
            .map_err(map_error)
    }

    async fn typing(&self, channel_id: u64) -> Result<(), GatewayError> {
        ChannelId::new(channel_id)
            .broadcast_typing(&self.http)
            .await
            .map_err(map_error)
    }

    async fn fetch_recent(
        &self,
        channel_id: u64,
        before: u64,
        limit: u8,
    ) -> Result<Vec<HistoricalMessage>, GatewayError> {
        let request = GetMessages::new()
            .before(MessageId::new(before))
            .limit(limit);
        let messages = ChannelId::new(channel_id)
            .messages(&self.http, request)
            .await
            .map_err(map_error)?;

        // Discord returns newest first.
        Ok(messages
            .into_iter()
            .rev()
            .map(|m| HistoricalMessage {
                author: m.author.display_name().to_string(),
                content: m.content,
            })
            .collect())
    }
}

/// 429 responses become [`GatewayError::RateLimited`]; serenity's error does
/// not carry the retry-after value, so the worker falls back to its default.
fn map_error(e: serenity::Error) -> GatewayError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)) = &e {
        if resp.status_code.as_u16() == 429 {
            return GatewayError::RateLimited { retry_after: None };
        }
    }
    GatewayError::Other(e.to_string())
}
