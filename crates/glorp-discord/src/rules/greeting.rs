use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::DispatchError;
use crate::random::{choose, RandomSource};
use crate::responses::GREETINGS;
use crate::rules::{Outcome, Rule, RuleContext};

pub const GREETING_CHANCE: f64 = 0.01;

/// Occasionally butts into the conversation with an unprompted greeting.
pub struct GreetingRule {
    random: Arc<dyn RandomSource>,
    chance: f64,
}

impl GreetingRule {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self {
            random,
            chance: GREETING_CHANCE,
        }
    }
}

#[async_trait]
impl Rule for GreetingRule {
    fn name(&self) -> &'static str {
        "greeting"
    }

    async fn apply(&self, ctx: &RuleContext<'_>) -> Result<Outcome, DispatchError> {
        if self.random.roll() >= self.chance {
            return Ok(Outcome::Continue);
        }
        let greeting = choose(self.random.as_ref(), GREETINGS);
        info!(channel_id = ctx.message.channel_id, "sending random greeting");
        ctx.send(greeting).await?;
        Ok(Outcome::Handled)
    }
}
