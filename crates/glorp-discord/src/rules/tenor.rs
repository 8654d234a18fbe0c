//! Reacts with 👽 to Tenor GIFs whose slug mentions glorp.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::info;

use crate::error::DispatchError;
use crate::reactions::{ReactionJob, ReactionQueue};
use crate::rules::{Outcome, Rule, RuleContext};

pub const TENOR_KEYWORD: &str = "glorp";
pub const TENOR_EMOJI: &str = "👽";

static TENOR_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://tenor\.com/view/(\S+)").expect("tenor regex should compile")
});

/// Count Tenor links in `text` whose slug contains `keyword` (case-insensitive).
pub fn matching_links(text: &str, keyword: &str) -> usize {
    TENOR_LINK
        .captures_iter(text)
        .filter(|caps| caps[1].to_lowercase().contains(keyword))
        .count()
}

/// Side effect only: queues reactions and always lets the message through.
pub struct TenorRule {
    reactions: Arc<ReactionQueue>,
}

impl TenorRule {
    pub fn new(reactions: Arc<ReactionQueue>) -> Self {
        Self { reactions }
    }
}

#[async_trait]
impl Rule for TenorRule {
    fn name(&self) -> &'static str {
        "tenor"
    }

    async fn apply(&self, ctx: &RuleContext<'_>) -> Result<Outcome, DispatchError> {
        let msg = ctx.message;
        let mut matches = matching_links(&msg.content, TENOR_KEYWORD);

        // Embeds are only consulted when the text itself had no match.
        if matches == 0 {
            matches = msg
                .embed_urls
                .iter()
                .filter(|url| url.contains("tenor.com"))
                .filter(|url| matching_links(url, TENOR_KEYWORD) > 0)
                .count();
        }

        for _ in 0..matches {
            self.reactions
                .enqueue(ReactionJob::new(msg.channel_id, msg.id, TENOR_EMOJI));
        }
        if matches > 0 {
            info!(message_id = msg.id, matches, "queued reaction for Tenor GIF");
        }
        Ok(Outcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockGateway;
    use crate::gateway::Gateway;
    use crate::rules::testing::{message, BOT_ID};

    #[test]
    fn slug_must_contain_keyword() {
        assert_eq!(
            matching_links("look https://tenor.com/view/Glorp-Dance-123", TENOR_KEYWORD),
            1
        );
        assert_eq!(
            matching_links("https://tenor.com/view/cat-dance-1", TENOR_KEYWORD),
            0
        );
        assert_eq!(
            matching_links(
                "http://tenor.com/view/glorp-a https://tenor.com/view/xglorpx-b",
                TENOR_KEYWORD
            ),
            2
        );
    }

    #[tokio::test]
    async fn queues_one_reaction_per_matching_link() {
        let queue = Arc::new(ReactionQueue::default());
        let rule = TenorRule::new(Arc::clone(&queue));
        let gateway: Arc<dyn Gateway> = Arc::new(MockGateway::new());
        let msg = message(
            5,
            "https://tenor.com/view/glorp-1 https://tenor.com/view/glorp-2",
        );

        let ctx = RuleContext::new(&msg, BOT_ID, &gateway);
        assert_eq!(rule.apply(&ctx).await.unwrap(), Outcome::Continue);
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn embeds_checked_only_without_content_match() {
        let queue = Arc::new(ReactionQueue::default());
        let rule = TenorRule::new(Arc::clone(&queue));
        let gateway: Arc<dyn Gateway> = Arc::new(MockGateway::new());

        let mut msg = message(5, "check this out");
        msg.embed_urls = vec!["https://tenor.com/view/glorp-wave-9".to_string()];
        rule.apply(&RuleContext::new(&msg, BOT_ID, &gateway))
            .await
            .unwrap();
        assert_eq!(queue.len(), 1);

        msg.content = "https://tenor.com/view/glorp-wave-9".to_string();
        rule.apply(&RuleContext::new(&msg, BOT_ID, &gateway))
            .await
            .unwrap();
        assert_eq!(queue.len(), 2);
    }
}
