use std::sync::Arc;

use chrono::{DateTime, Utc};
use serenity::async_trait;
use serenity::model::channel::{Message, Reaction};
use serenity::model::gateway::Ready;
use serenity::prelude::{Context, EventHandler};
use tokio::sync::watch;
use tracing::info;

use glorp_core::types::{Author, InboundMessage, ReactionEvent};

use crate::dispatcher::Dispatcher;
use crate::gateway::Gateway;
use crate::presence;
use crate::random::RandomSource;

/// Serenity event handler feeding the dispatcher.
///
/// Serenity runs every event callback in its own task, so a slow AI call
/// never holds up other messages.
#[derive(Clone)]
pub struct GlorpHandler {
    pub dispatcher: Arc<Dispatcher>,
    pub gateway: Arc<dyn Gateway>,
    pub random: Arc<dyn RandomSource>,
    /// Latest shard context, for jobs that change presence between events.
    pub context_tx: Arc<watch::Sender<Option<Context>>>,
}

#[async_trait]
impl EventHandler for GlorpHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        self.dispatcher.set_bot_id(ready.user.id.get());

        let status = presence::random_status(self.random.as_ref());
        ctx.set_activity(Some(status.activity()));

        info!(
            name = %ready.user.name,
            guilds = ready.guilds.len(),
            status = status.name,
            "Discord bot connected"
        );
        self.context_tx.send_replace(Some(ctx));
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let inbound = to_inbound(&msg);
        self.dispatcher.dispatch(&self.gateway, &inbound).await;
    }

    async fn reaction_add(&self, _ctx: Context, reaction: Reaction) {
        let Some(user_id) = reaction.user_id else {
            return;
        };
        let event = ReactionEvent {
            channel_id: reaction.channel_id.get(),
            message_id: reaction.message_id.get(),
            user_id: user_id.get(),
            emoji: reaction.emoji.to_string(),
        };
        self.dispatcher.on_reaction(&event);
    }
}

fn to_inbound(msg: &Message) -> InboundMessage {
    InboundMessage {
        id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        author: Author {
            id: msg.author.id.get(),
            name: msg.author.name.clone(),
            bot: msg.author.bot,
        },
        content: msg.content.clone(),
        mentions: msg.mentions.iter().map(|u| u.id.get()).collect(),
        embed_urls: msg.embeds.iter().filter_map(|e| e.url.clone()).collect(),
        timestamp: DateTime::<Utc>::from_timestamp(msg.timestamp.unix_timestamp(), 0)
            .unwrap_or_else(Utc::now),
    }
}
