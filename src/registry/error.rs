//! Registry errors.
//!
//! Every failed registry call is reported synchronously and leaves the
//! registry exactly as it was before the call.

use crate::address::Address;
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Topic {0} does not exist")]
    UnknownTopic(u64),

    #[error("Option '{option}' is not part of topic {topic_id}")]
    UnknownOption { topic_id: u64, option: String },

    #[error("You have already voted on this topic ({voter} on topic {topic_id})")]
    AlreadyVoted { topic_id: u64, voter: Address },

    #[error("Voting has ended for topic {topic_id} (ended at {end_time})")]
    VotingEnded { topic_id: u64, end_time: u64 },

    #[error("Topic {0} is already finalized")]
    AlreadyFinalized(u64),

    #[error("Voting is still open for topic {topic_id} until {end_time}")]
    VotingInProgress { topic_id: u64, end_time: u64 },

    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("Unauthorized: {caller} is not allowed to perform this operation")]
    Unauthorized { caller: Address },

    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}
