//! `!votekick @user`: a 60 second reaction vote. Nobody actually gets kicked.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use glorp_core::types::mention;

use crate::error::DispatchError;
use crate::gateway::Gateway;
use crate::responses::{
    votekick_announcement, votekick_failed, votekick_passed, VOTEKICK_SELF, VOTEKICK_USAGE,
};
use crate::rules::{Outcome, Rule, RuleContext};
use crate::votes::{VoteBoard, VOTE_EMOJI};

pub const VOTE_DURATION: Duration = Duration::from_secs(60);

pub struct VoteKickRule {
    votes: Arc<VoteBoard>,
    duration: Duration,
}

impl VoteKickRule {
    pub fn new(votes: Arc<VoteBoard>) -> Self {
        Self {
            votes,
            duration: VOTE_DURATION,
        }
    }
}

#[async_trait]
impl Rule for VoteKickRule {
    fn name(&self) -> &'static str {
        "votekick"
    }

    async fn apply(&self, ctx: &RuleContext<'_>) -> Result<Outcome, DispatchError> {
        match ctx.command() {
            Some((command, _)) if command == "votekick" => {}
            _ => return Ok(Outcome::Continue),
        }

        let Some(&target) = ctx.message.mentions.first() else {
            ctx.reply(VOTEKICK_USAGE).await?;
            return Ok(Outcome::Handled);
        };
        if target == ctx.bot_id {
            ctx.reply(VOTEKICK_SELF).await?;
            return Ok(Outcome::Handled);
        }

        let channel_id = ctx.message.channel_id;
        let announcement = ctx.send(&votekick_announcement(&mention(target))).await?;
        self.votes.open(announcement, target);
        info!(
            channel_id,
            target,
            announcement,
            initiator = ctx.message.author.id,
            "vote kick started"
        );

        if let Err(e) = ctx
            .gateway
            .add_reaction(channel_id, announcement, VOTE_EMOJI)
            .await
        {
            warn!(announcement, error = %e, "failed to add vote reaction");
        }

        tokio::spawn(close_vote(
            Arc::clone(ctx.gateway),
            Arc::clone(&self.votes),
            channel_id,
            announcement,
            self.duration,
        ));
        Ok(Outcome::Handled)
    }
}

/// Wait out the vote, then announce the result. The record is removed
/// whether or not the announcement goes through.
async fn close_vote(
    gateway: Arc<dyn Gateway>,
    votes: Arc<VoteBoard>,
    channel_id: u64,
    announcement: u64,
    wait: Duration,
) {
    tokio::time::sleep(wait).await;

    let Some(tally) = votes.close(announcement) else {
        return;
    };
    let target = mention(tally.target);
    let text = if tally.passed() {
        votekick_passed(&target)
    } else {
        votekick_failed(&target, tally.votes)
    };
    info!(announcement, votes = tally.votes, passed = tally.passed(), "vote kick closed");

    if let Err(e) = gateway.send_text(channel_id, &text).await {
        warn!(announcement, error = %e, "failed to announce vote kick result");
    }
}
