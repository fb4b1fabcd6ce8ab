//! Topic and voter record types.

use crate::address::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state of a topic at a given time.
///
/// `Open -> Closed -> Finalized`. `Finalized` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicState {
    /// Accepting votes (`now < end_time`).
    Open,
    /// Voting period over, finalization pending.
    Closed,
    /// Weighted tallies computed. Terminal.
    Finalized,
}

impl std::fmt::Display for TopicState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

/// A recorded vote intent.
///
/// Presence of a record is what blocks a second vote from the same voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    /// Index into the topic's options.
    pub option_index: usize,
    /// Balance captured when the vote was cast (vote-time weighting only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_snapshot: Option<u128>,
}

/// A votable topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: u64,
    pub description: String,
    /// Unix seconds. Voting is allowed while `now < end_time`.
    pub end_time: u64,
    pub options: Vec<String>,
    /// Token whose balances weight the votes.
    pub token: Address,
    pub finalized: bool,
    /// Accumulated weight per option index. Zero until finalized.
    pub vote_counts: Vec<u128>,
    /// Voter -> recorded intent.
    pub voters: BTreeMap<Address, VoterRecord>,
}

impl Topic {
    pub(crate) fn new(
        id: u64,
        description: String,
        end_time: u64,
        options: Vec<String>,
        token: Address,
    ) -> Self {
        let vote_counts = vec![0; options.len()];
        Self {
            id,
            description,
            end_time,
            options,
            token,
            finalized: false,
            vote_counts,
            voters: BTreeMap::new(),
        }
    }

    /// Position of `label` in the option list.
    pub fn option_index(&self, label: &str) -> Option<usize> {
        self.options.iter().position(|o| o == label)
    }

    pub fn state_at(&self, now: u64) -> TopicState {
        if self.finalized {
            TopicState::Finalized
        } else if now < self.end_time {
            TopicState::Open
        } else {
            TopicState::Closed
        }
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.voters.contains_key(voter)
    }

    /// Number of recorded voters.
    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    pub fn details(&self) -> TopicDetails {
        TopicDetails {
            description: self.description.clone(),
            end_time: self.end_time,
            options: self.options.clone(),
            vote_counts: self.vote_counts.clone(),
        }
    }
}

/// Read view returned by `get_topic_details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDetails {
    pub description: String,
    pub end_time: u64,
    pub options: Vec<String>,
    pub vote_counts: Vec<u128>,
}
