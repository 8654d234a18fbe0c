//! Trigger rules, evaluated in a fixed order by the dispatcher.

use std::sync::Arc;

use async_trait::async_trait;

use glorp_core::types::InboundMessage;

use crate::error::DispatchError;
use crate::gateway::Gateway;

pub mod ai;
pub mod commands;
pub mod greeting;
pub mod insult;
pub mod laughter;
pub mod self_filter;
pub mod tenor;
pub mod votekick;

pub use ai::AiRule;
pub use commands::CommandRule;
pub use greeting::GreetingRule;
pub use insult::InsultRule;
pub use laughter::LaughterRule;
pub use self_filter::SelfFilter;
pub use tenor::TenorRule;
pub use votekick::VoteKickRule;

/// What the dispatcher does after a rule ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Try the next rule.
    Continue,
    /// The message is consumed; later rules do not see it.
    Handled,
}

/// One message as seen by the rules.
pub struct RuleContext<'a> {
    pub message: &'a InboundMessage,
    pub bot_id: u64,
    pub gateway: &'a Arc<dyn Gateway>,
    lowered: String,
}

impl<'a> RuleContext<'a> {
    pub fn new(message: &'a InboundMessage, bot_id: u64, gateway: &'a Arc<dyn Gateway>) -> Self {
        Self {
            message,
            bot_id,
            gateway,
            lowered: message.content.to_lowercase(),
        }
    }

    /// Message content in lowercase.
    pub fn lowered(&self) -> &str {
        &self.lowered
    }

    /// `!name rest` split into the lowercased command word and its argument.
    pub fn command(&self) -> Option<(String, &str)> {
        parse_command(&self.message.content)
    }

    pub async fn reply(&self, text: &str) -> Result<u64, DispatchError> {
        Ok(self
            .gateway
            .reply(self.message.channel_id, self.message.id, text)
            .await?)
    }

    pub async fn send(&self, text: &str) -> Result<u64, DispatchError> {
        Ok(self.gateway.send_text(self.message.channel_id, text).await?)
    }
}

#[async_trait]
pub trait Rule: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    async fn apply(&self, ctx: &RuleContext<'_>) -> Result<Outcome, DispatchError>;
}

fn parse_command(content: &str) -> Option<(String, &str)> {
    let body = content.trim_start().strip_prefix('!')?;
    let (word, rest) = body
        .split_once(char::is_whitespace)
        .unwrap_or((body, ""));
    if word.is_empty() {
        return None;
    }
    Some((word.to_lowercase(), rest.trim()))
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::Utc;
    use glorp_core::types::{Author, InboundMessage};

    pub const BOT_ID: u64 = 1;
    pub const CHANNEL: u64 = 77;

    pub fn message(author: u64, content: &str) -> InboundMessage {
        InboundMessage {
            id: 500,
            channel_id: CHANNEL,
            author: Author {
                id: author,
                name: format!("user{author}"),
                bot: false,
            },
            content: content.to_string(),
            mentions: Vec::new(),
            embed_urls: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}
