//! Platform-neutral event types handed from the gateway adapter to the dispatcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub name: String,
    /// Set for bot and webhook accounts.
    pub bot: bool,
}

/// A message event as delivered by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: u64,
    pub channel_id: u64,
    pub author: Author,
    pub content: String,
    /// User ids mentioned in the message, in order of appearance.
    pub mentions: Vec<u64>,
    /// URLs of embeds the platform attached (link previews, GIF embeds).
    pub embed_urls: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    pub fn mentions_user(&self, user_id: u64) -> bool {
        self.mentions.contains(&user_id)
    }
}

/// A reaction-add event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub channel_id: u64,
    pub message_id: u64,
    pub user_id: u64,
    /// Unicode emoji; custom emoji are rendered as `<:name:id>`.
    pub emoji: String,
}

/// A past channel message, as fetched for summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalMessage {
    pub author: String,
    pub content: String,
}

/// Render a user mention token.
pub fn mention(user_id: u64) -> String {
    format!("<@{user_id}>")
}

/// Remove every mention token for `user_id` (both `<@id>` and the legacy
/// nickname form `<@!id>`) and trim the remainder.
pub fn strip_mention(content: &str, user_id: u64) -> String {
    content
        .replace(&format!("<@!{user_id}>"), "")
        .replace(&mention(user_id), "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_mention_removes_both_forms() {
        assert_eq!(strip_mention("<@42> hello there", 42), "hello there");
        assert_eq!(strip_mention("hey <@!42>, sup", 42), "hey , sup");
        assert_eq!(strip_mention("<@7> not me", 42), "<@7> not me");
    }
}
