//! AI chat on mention, and `!tldr` channel summaries.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use glorp_agent::{AiEngine, EngineError};
use glorp_core::types::strip_mention;

use crate::error::DispatchError;
use crate::responses::{tldr_prompt, AI_BUSY, AI_ERROR, AI_TIMEOUT, TLDR_EMPTY};
use crate::rules::{Outcome, Rule, RuleContext};

/// Messages read back for `!tldr`.
pub const TLDR_MESSAGES: u8 = 15;
/// Discord drops the typing indicator after about ten seconds.
const TYPING_REFRESH: Duration = Duration::from_secs(8);

pub struct AiRule {
    engine: Arc<AiEngine>,
}

impl AiRule {
    pub fn new(engine: Arc<AiEngine>) -> Self {
        Self { engine }
    }

    async fn chat(&self, ctx: &RuleContext<'_>) -> Result<Outcome, DispatchError> {
        let msg = ctx.message;
        let permit = match self.engine.try_acquire() {
            Ok(permit) => permit,
            Err(e) => return self.apologize(ctx, e).await,
        };

        let content = strip_mention(&msg.content, ctx.bot_id);
        let prior = self.engine.history().get(msg.channel_id);
        info!(
            channel_id = msg.channel_id,
            author = %msg.author.name,
            "AI chat request"
        );

        let result = with_typing(ctx, permit.respond(msg.channel_id, &content, prior)).await;
        match result {
            Ok(reply) => {
                ctx.send(&reply).await?;
                Ok(Outcome::Handled)
            }
            Err(e) => self.apologize(ctx, e).await,
        }
    }

    async fn summarize(&self, ctx: &RuleContext<'_>) -> Result<Outcome, DispatchError> {
        let msg = ctx.message;
        let permit = match self.engine.try_acquire() {
            Ok(permit) => permit,
            Err(e) => return self.apologize(ctx, e).await,
        };

        let recent = ctx
            .gateway
            .fetch_recent(msg.channel_id, msg.id, TLDR_MESSAGES)
            .await?;
        let transcript = recent
            .iter()
            .filter(|m| !m.content.trim().is_empty())
            .map(|m| format!("{}: {}", m.author, m.content))
            .collect::<Vec<_>>()
            .join("\n");
        if transcript.is_empty() {
            ctx.reply(TLDR_EMPTY).await?;
            return Ok(Outcome::Handled);
        }

        info!(channel_id = msg.channel_id, messages = recent.len(), "summarizing channel");
        match with_typing(ctx, permit.ask(msg.channel_id, &tldr_prompt(&transcript))).await {
            Ok(summary) => {
                ctx.send(&summary).await?;
                Ok(Outcome::Handled)
            }
            Err(e) => self.apologize(ctx, e).await,
        }
    }

    /// Short user-facing notice; details were already logged by the engine.
    async fn apologize(
        &self,
        ctx: &RuleContext<'_>,
        err: EngineError,
    ) -> Result<Outcome, DispatchError> {
        let text = match err {
            EngineError::Busy => {
                info!(user_id = ctx.message.author.id, "AI busy, rejecting request");
                AI_BUSY
            }
            EngineError::TimedOut { .. } => AI_TIMEOUT,
            EngineError::Provider(_) => AI_ERROR,
        };
        ctx.reply(text).await?;
        Ok(Outcome::Handled)
    }
}

/// Drive `work` while keeping the channel's typing indicator alive.
async fn with_typing<T>(ctx: &RuleContext<'_>, work: impl Future<Output = T>) -> T {
    tokio::pin!(work);
    loop {
        if let Err(e) = ctx.gateway.typing(ctx.message.channel_id).await {
            debug!(error = %e, "typing indicator failed");
        }
        tokio::select! {
            out = &mut work => return out,
            _ = tokio::time::sleep(TYPING_REFRESH) => {}
        }
    }
}

#[async_trait]
impl Rule for AiRule {
    fn name(&self) -> &'static str {
        "ai"
    }

    async fn apply(&self, ctx: &RuleContext<'_>) -> Result<Outcome, DispatchError> {
        if matches!(ctx.command(), Some((command, _)) if command == "tldr") {
            return self.summarize(ctx).await;
        }
        if ctx.message.mentions_user(ctx.bot_id) {
            return self.chat(ctx).await;
        }
        Ok(Outcome::Continue)
    }
}
