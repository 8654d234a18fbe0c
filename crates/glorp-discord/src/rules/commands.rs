//! Static `!` commands with canned replies.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::DispatchError;
use crate::random::{choose, RandomSource};
use crate::responses::{
    coinflip_reply, eight_ball_reply, COIN_SIDES, EIGHT_BALL, EIGHT_BALL_USAGE, HELP, JOKES, PING,
};
use crate::rules::{Outcome, Rule, RuleContext};

pub struct CommandRule {
    random: Arc<dyn RandomSource>,
}

impl CommandRule {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Reply text for `command`, or `None` when it is not a static command.
    pub fn respond(&self, command: &str, arg: &str) -> Option<String> {
        let random = self.random.as_ref();
        let text = match command {
            "ping" => PING.to_string(),
            "help" => HELP.to_string(),
            "joke" => choose(random, JOKES).to_string(),
            "coinflip" => coinflip_reply(choose(random, COIN_SIDES)),
            "8ball" if arg.is_empty() => EIGHT_BALL_USAGE.to_string(),
            "8ball" => eight_ball_reply(choose(random, EIGHT_BALL)),
            _ => return None,
        };
        Some(text)
    }
}

#[async_trait]
impl Rule for CommandRule {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn apply(&self, ctx: &RuleContext<'_>) -> Result<Outcome, DispatchError> {
        let Some((command, arg)) = ctx.command() else {
            return Ok(Outcome::Continue);
        };
        let Some(text) = self.respond(&command, arg) else {
            return Ok(Outcome::Continue);
        };
        info!(command = %command, user_id = ctx.message.author.id, "handling command");
        ctx.reply(&text).await?;
        Ok(Outcome::Handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::fixed::FixedRandom;

    fn rule(index: usize) -> CommandRule {
        CommandRule::new(Arc::new(FixedRandom { roll: 0.5, index }))
    }

    #[test]
    fn canned_replies() {
        let rule = rule(1);
        assert_eq!(rule.respond("ping", "").unwrap(), PING);
        assert!(rule.respond("help", "").unwrap().contains("!votekick"));
        assert_eq!(rule.respond("coinflip", "").unwrap(), "The coin lands on **Tails**!");
        assert_eq!(rule.respond("joke", "").unwrap(), JOKES[1]);
    }

    #[test]
    fn eight_ball_needs_a_question() {
        let rule = rule(19);
        assert_eq!(rule.respond("8ball", "").unwrap(), EIGHT_BALL_USAGE);
        assert_eq!(rule.respond("8ball", "will it work?").unwrap(), "🎱 No way, Jose!");
    }

    #[test]
    fn unknown_and_dynamic_commands_fall_through() {
        let rule = rule(0);
        assert!(rule.respond("votekick", "").is_none());
        assert!(rule.respond("tldr", "").is_none());
        assert!(rule.respond("dance", "").is_none());
    }
}
