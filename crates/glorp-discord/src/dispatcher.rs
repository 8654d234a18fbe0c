//! Per-message rule chain.

use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use glorp_agent::AiEngine;
use glorp_core::types::{InboundMessage, ReactionEvent};

use crate::cooldown::CooldownTracker;
use crate::gateway::Gateway;
use crate::random::RandomSource;
use crate::reactions::ReactionQueue;
use crate::rules::{
    AiRule, CommandRule, GreetingRule, InsultRule, LaughterRule, Outcome, Rule, RuleContext,
    SelfFilter, TenorRule, VoteKickRule,
};
use crate::votes::VoteBoard;

/// Shared state the standard rule chain is built from.
pub struct DispatcherDeps {
    pub random: Arc<dyn RandomSource>,
    pub cooldowns: Arc<CooldownTracker>,
    pub reactions: Arc<ReactionQueue>,
    pub votes: Arc<VoteBoard>,
    pub engine: Arc<AiEngine>,
}

/// Runs every inbound message through an ordered list of rules, stopping at
/// the first one that handles it.
pub struct Dispatcher {
    rules: Vec<Box<dyn Rule>>,
    votes: Arc<VoteBoard>,
    bot_id: OnceLock<u64>,
}

impl Dispatcher {
    pub fn new(rules: Vec<Box<dyn Rule>>, votes: Arc<VoteBoard>) -> Self {
        Self {
            rules,
            votes,
            bot_id: OnceLock::new(),
        }
    }

    /// The production chain, in priority order.
    pub fn standard(deps: DispatcherDeps) -> Self {
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(SelfFilter),
            Box::new(TenorRule::new(deps.reactions)),
            Box::new(GreetingRule::new(Arc::clone(&deps.random))),
            Box::new(LaughterRule::new(Arc::clone(&deps.random))),
            Box::new(InsultRule::new(Arc::clone(&deps.random), deps.cooldowns)),
            Box::new(CommandRule::new(deps.random)),
            Box::new(VoteKickRule::new(Arc::clone(&deps.votes))),
            Box::new(AiRule::new(deps.engine)),
        ];
        Self::new(rules, deps.votes)
    }

    /// Set once the gateway reports who we are. Later calls are ignored.
    pub fn set_bot_id(&self, bot_id: u64) {
        self.bot_id.set(bot_id).ok();
    }

    pub fn bot_id(&self) -> Option<u64> {
        self.bot_id.get().copied()
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluate the rule chain for one message.
    ///
    /// Returns the name of the rule that consumed the message, or `None` when
    /// every rule let it through. A failing rule is logged and also ends
    /// processing of the message.
    pub async fn dispatch(
        &self,
        gateway: &Arc<dyn Gateway>,
        message: &InboundMessage,
    ) -> Option<&'static str> {
        let Some(bot_id) = self.bot_id() else {
            debug!(message_id = message.id, "message before ready, ignoring");
            return None;
        };
        let ctx = RuleContext::new(message, bot_id, gateway);

        for rule in &self.rules {
            match rule.apply(&ctx).await {
                Ok(Outcome::Continue) => {}
                Ok(Outcome::Handled) => {
                    debug!(rule = rule.name(), message_id = message.id, "message handled");
                    return Some(rule.name());
                }
                Err(e) => {
                    warn!(
                        rule = rule.name(),
                        message_id = message.id,
                        channel_id = message.channel_id,
                        error = %e,
                        "rule failed, abandoning message"
                    );
                    return Some(rule.name());
                }
            }
        }
        None
    }

    /// Count a reaction toward an active vote-kick. Returns whether it counted.
    pub fn on_reaction(&self, event: &ReactionEvent) -> bool {
        let Some(bot_id) = self.bot_id() else {
            return false;
        };
        let counted = self
            .votes
            .vote(event.message_id, event.user_id, &event.emoji, bot_id);
        if counted {
            debug!(
                announcement = event.message_id,
                voter = event.user_id,
                "vote recorded"
            );
        }
        counted
    }
}
