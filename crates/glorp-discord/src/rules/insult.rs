//! Comebacks for insults, at most one per user per cooldown window.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cooldown::CooldownTracker;
use crate::error::DispatchError;
use crate::random::{choose, RandomSource};
use crate::responses::{insult_reply, INSULTING_WORDS, INSULT_TEMPLATES};
use crate::rules::{Outcome, Rule, RuleContext};

pub struct InsultRule {
    random: Arc<dyn RandomSource>,
    cooldowns: Arc<CooldownTracker>,
}

impl InsultRule {
    pub fn new(random: Arc<dyn RandomSource>, cooldowns: Arc<CooldownTracker>) -> Self {
        Self { random, cooldowns }
    }
}

/// First insulting word of the list that occurs in `lowered`.
pub fn detect_insult(lowered: &str) -> Option<&'static str> {
    INSULTING_WORDS.iter().copied().find(|w| lowered.contains(w))
}

#[async_trait]
impl Rule for InsultRule {
    fn name(&self) -> &'static str {
        "insult"
    }

    async fn apply(&self, ctx: &RuleContext<'_>) -> Result<Outcome, DispatchError> {
        let Some(insult) = detect_insult(ctx.lowered()) else {
            return Ok(Outcome::Continue);
        };
        let user_id = ctx.message.author.id;
        if self.cooldowns.is_cooling_down(user_id, Instant::now()) {
            debug!(user_id, insult, "insult ignored, user on cooldown");
            return Ok(Outcome::Continue);
        }

        let response = insult_reply(choose(self.random.as_ref(), INSULT_TEMPLATES), insult);
        info!(user_id, response = %response, "sending insult response");
        ctx.reply(&response).await?;
        // Only a delivered comeback starts the cooldown.
        self.cooldowns.record(user_id, Instant::now());
        Ok(Outcome::Handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_word_in_list_order_wins() {
        assert_eq!(detect_insult("you stupid loser"), Some("loser"));
        assert_eq!(detect_insult("what a moron"), Some("moron"));
        assert_eq!(detect_insult("have a nice day"), None);
    }
}
