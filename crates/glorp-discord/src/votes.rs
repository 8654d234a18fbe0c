//! Active vote-kicks, keyed by the announcement message id.

use std::collections::HashSet;

use dashmap::DashMap;
use tokio::time::Instant;

pub const VOTE_EMOJI: &str = "✅";
pub const VOTES_NEEDED: usize = 4;

#[derive(Debug, Clone)]
pub struct VoteKick {
    pub target: u64,
    pub voters: HashSet<u64>,
    pub created_at: Instant,
}

/// Final count of a closed vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub target: u64,
    pub votes: usize,
}

impl Tally {
    pub fn passed(&self) -> bool {
        self.votes >= VOTES_NEEDED
    }
}

/// Concurrent registry of running vote-kicks.
#[derive(Default)]
pub struct VoteBoard {
    active: DashMap<u64, VoteKick>,
}

impl VoteBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, announcement_id: u64, target: u64) {
        self.active.insert(
            announcement_id,
            VoteKick {
                target,
                voters: HashSet::new(),
                created_at: Instant::now(),
            },
        );
    }

    /// Count a reaction toward the vote announced by `announcement_id`.
    ///
    /// Only the vote emoji counts, neither the bot nor the target can vote,
    /// and each voter counts once. Returns whether a new vote was recorded.
    pub fn vote(&self, announcement_id: u64, voter: u64, emoji: &str, bot_id: u64) -> bool {
        if emoji != VOTE_EMOJI || voter == bot_id {
            return false;
        }
        match self.active.get_mut(&announcement_id) {
            Some(mut kick) if kick.target != voter => kick.voters.insert(voter),
            _ => false,
        }
    }

    pub fn votes(&self, announcement_id: u64) -> Option<usize> {
        self.active.get(&announcement_id).map(|k| k.voters.len())
    }

    /// Remove the vote and report its final count.
    pub fn close(&self, announcement_id: u64) -> Option<Tally> {
        self.active.remove(&announcement_id).map(|(_, kick)| Tally {
            target: kick.target,
            votes: kick.voters.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
