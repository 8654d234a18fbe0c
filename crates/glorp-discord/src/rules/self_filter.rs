use async_trait::async_trait;

use crate::error::DispatchError;
use crate::rules::{Outcome, Rule, RuleContext};

/// Drops the bot's own messages and those of every other bot.
pub struct SelfFilter;

#[async_trait]
impl Rule for SelfFilter {
    fn name(&self) -> &'static str {
        "self_filter"
    }

    async fn apply(&self, ctx: &RuleContext<'_>) -> Result<Outcome, DispatchError> {
        let author = &ctx.message.author;
        if author.bot || author.id == ctx.bot_id {
            return Ok(Outcome::Handled);
        }
        Ok(Outcome::Continue)
    }
}
