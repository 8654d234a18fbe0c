use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::DispatchError;
use crate::random::{choose, RandomSource};
use crate::responses::{LAUGHTER_REPLIES, LAUGHTER_TRIGGERS};
use crate::rules::{Outcome, Rule, RuleContext};

pub struct LaughterRule {
    random: Arc<dyn RandomSource>,
}

impl LaughterRule {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }
}

#[async_trait]
impl Rule for LaughterRule {
    fn name(&self) -> &'static str {
        "laughter"
    }

    async fn apply(&self, ctx: &RuleContext<'_>) -> Result<Outcome, DispatchError> {
        let lowered = ctx.lowered();
        if !LAUGHTER_TRIGGERS.iter().any(|t| lowered.contains(t)) {
            return Ok(Outcome::Continue);
        }
        let response = choose(self.random.as_ref(), LAUGHTER_REPLIES);
        info!(message_id = ctx.message.id, response, "sending laughter response");
        ctx.reply(response).await?;
        Ok(Outcome::Handled)
    }
}
