//! Voting registry: topics, votes and weighted finalization.
//!
//! Mirrors the rules of the deployed voting contract as a deterministic,
//! single-writer state machine:
//!
//! - Topic ids are dense and assigned from 0 in creation order
//! - Each voter may vote once per topic, and only while `now < end_time`
//! - Votes record intent only; tallies stay zero until finalization
//! - Finalization runs once per topic, after voting has ended, and turns
//!   recorded intents into token-weighted tallies
//!
//! The registry never reads the clock or the ledger itself. Callers pass the
//! current time and the balances in, which keeps every operation a pure,
//! all-or-nothing state transition. See [`crate::service`] for the async
//! wrapper that fetches those inputs from a ledger.

pub mod error;
pub mod event_stream;
pub mod events;
pub mod policy;
pub mod topic;

#[cfg(test)]
mod proptests;

pub use error::{RegistryError, RegistryResult};
pub use event_stream::{EventStream, EventStreamSink};
pub use events::{EventLog, EventSink, RegistryEvent};
pub use policy::{AuthorizationPolicy, RegistryPolicy, WeightPolicy};
pub use topic::{Topic, TopicDetails, TopicState, VoterRecord};

use crate::address::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

/// Arguments for [`VotingRegistry::create_topic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTopic {
    pub description: String,
    /// Unix seconds.
    pub end_time: u64,
    pub options: Vec<String>,
    pub token: Address,
}

/// Serializable registry contents (everything except the observers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub owner: Address,
    #[serde(default)]
    pub policy: RegistryPolicy,
    pub topics: Vec<Topic>,
}

/// The voting state machine.
pub struct VotingRegistry {
    owner: Address,
    policy: RegistryPolicy,
    /// Arena indexed by topic id.
    topics: Vec<Topic>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl VotingRegistry {
    /// Create an empty registry owned by `owner`.
    pub fn new(owner: Address, policy: RegistryPolicy) -> Self {
        Self {
            owner,
            policy,
            topics: Vec::new(),
            sinks: Vec::new(),
        }
    }

    /// Restore a registry from a snapshot. Observers are not part of the
    /// snapshot and must be registered again.
    ///
    /// The snapshot usually comes from disk, so every topic is checked
    /// against the invariants the write operations maintain.
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> RegistryResult<Self> {
        for (position, topic) in snapshot.topics.iter().enumerate() {
            if let Err(e) = validate_restored(position, topic) {
                warn!(topic_id = topic.id, error = %e, "snapshot rejected");
                return Err(e);
            }
        }

        Ok(Self {
            owner: snapshot.owner,
            policy: snapshot.policy,
            topics: snapshot.topics,
            sinks: Vec::new(),
        })
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            owner: self.owner,
            policy: self.policy,
            topics: self.topics.clone(),
        }
    }

    /// Register an observer for all future notifications.
    pub fn subscribe<S: EventSink + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn policy(&self) -> RegistryPolicy {
        self.policy
    }

    /// Create a new topic and return its id.
    pub fn create_topic(
        &mut self,
        caller: &Address,
        now: u64,
        request: CreateTopic,
    ) -> RegistryResult<u64> {
        if !self.policy.authorization.permits(&self.owner, caller) {
            warn!(caller = %caller, "create_topic rejected: unauthorized");
            return Err(RegistryError::Unauthorized { caller: *caller });
        }

        if let Err(e) = validate_topic(&request, now) {
            warn!(caller = %caller, error = %e, "create_topic rejected");
            return Err(e);
        }

        let CreateTopic {
            description,
            end_time,
            options,
            token,
        } = request;

        let topic_id = self.topics.len() as u64;
        self.topics.push(Topic::new(
            topic_id,
            description.clone(),
            end_time,
            options,
            token,
        ));

        info!(topic_id, end_time, token = %token, "topic created");
        self.emit(RegistryEvent::TopicCreated {
            topic_id,
            description,
            end_time,
        });

        Ok(topic_id)
    }

    /// Record `caller`'s vote for `option` on `topic_id`.
    ///
    /// `weight_snapshot` is the caller's balance at vote time. It is stored
    /// only under [`WeightPolicy::BalanceAtVote`] and ignored otherwise.
    pub fn vote(
        &mut self,
        caller: &Address,
        now: u64,
        topic_id: u64,
        option: &str,
        weight_snapshot: Option<u128>,
    ) -> RegistryResult<()> {
        let weighting = self.policy.weighting;
        let topic = self.topic_mut(topic_id)?;

        // Deadline is checked before the option and the voter.
        if now >= topic.end_time {
            warn!(topic_id, voter = %caller, now, "vote rejected: voting has ended");
            return Err(RegistryError::VotingEnded {
                topic_id,
                end_time: topic.end_time,
            });
        }

        let option_index = topic.option_index(option).ok_or_else(|| {
            warn!(topic_id, voter = %caller, option, "vote rejected: unknown option");
            RegistryError::UnknownOption {
                topic_id,
                option: option.to_string(),
            }
        })?;

        if topic.has_voted(caller) {
            warn!(topic_id, voter = %caller, "vote rejected: already voted");
            return Err(RegistryError::AlreadyVoted {
                topic_id,
                voter: *caller,
            });
        }

        let weight_snapshot = match weighting {
            WeightPolicy::BalanceAtVote => weight_snapshot,
            WeightPolicy::BalanceAtFinalization => None,
        };

        topic.voters.insert(
            *caller,
            VoterRecord {
                option_index,
                weight_snapshot,
            },
        );

        info!(topic_id, voter = %caller, option, "vote recorded");
        self.emit(RegistryEvent::Voted {
            topic_id,
            voter: *caller,
            option: option.to_string(),
        });

        Ok(())
    }

    /// Check every finalization precondition without mutating anything.
    ///
    /// Returns the topic so callers can fetch balances for its voters before
    /// calling [`finalize_votes`](Self::finalize_votes).
    pub fn check_finalizable(
        &self,
        caller: &Address,
        now: u64,
        topic_id: u64,
    ) -> RegistryResult<&Topic> {
        let topic = self.topic(topic_id)?;

        if !self.policy.authorization.permits(&self.owner, caller) {
            return Err(RegistryError::Unauthorized { caller: *caller });
        }

        if topic.finalized {
            return Err(RegistryError::AlreadyFinalized(topic_id));
        }

        if now < topic.end_time {
            return Err(RegistryError::VotingInProgress {
                topic_id,
                end_time: topic.end_time,
            });
        }

        Ok(topic)
    }

    /// Turn recorded votes into weighted tallies and lock the topic.
    ///
    /// Under [`WeightPolicy::BalanceAtFinalization`] each voter weighs their
    /// entry in `balances` (0 if absent). Under
    /// [`WeightPolicy::BalanceAtVote`] the snapshot stored with the vote is
    /// used and `balances` is ignored.
    pub fn finalize_votes(
        &mut self,
        caller: &Address,
        now: u64,
        topic_id: u64,
        balances: &HashMap<Address, u128>,
    ) -> RegistryResult<Vec<u128>> {
        if let Err(e) = self.check_finalizable(caller, now, topic_id) {
            warn!(topic_id, caller = %caller, error = %e, "finalize rejected");
            return Err(e);
        }

        let weighting = self.policy.weighting;
        let topic = self.topic_mut(topic_id)?;

        let tallies = tally(topic.options.len(), &topic.voters, weighting, balances);
        topic.vote_counts = tallies.clone();
        topic.finalized = true;

        info!(
            topic_id,
            voters = topic.voters.len(),
            ?tallies,
            "votes finalized"
        );
        self.emit(RegistryEvent::VotesFinalized { topic_id });

        Ok(tallies)
    }

    /// Description, end time, options and tallies of a topic.
    pub fn get_topic_details(&self, topic_id: u64) -> RegistryResult<TopicDetails> {
        debug!(topic_id, "get_topic_details");
        Ok(self.topic(topic_id)?.details())
    }

    /// Tally for one option. Zero until the topic is finalized.
    pub fn get_votes(&self, topic_id: u64, option: &str) -> RegistryResult<u128> {
        let topic = self.topic(topic_id)?;
        let index = topic
            .option_index(option)
            .ok_or_else(|| RegistryError::UnknownOption {
                topic_id,
                option: option.to_string(),
            })?;
        Ok(topic.vote_counts[index])
    }

    pub fn get_topic_count(&self) -> u64 {
        self.topics.len() as u64
    }

    pub fn topic(&self, topic_id: u64) -> RegistryResult<&Topic> {
        usize::try_from(topic_id)
            .ok()
            .and_then(|index| self.topics.get(index))
            .ok_or(RegistryError::UnknownTopic(topic_id))
    }

    /// All topics in id order.
    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter()
    }

    pub fn has_voted(&self, topic_id: u64, voter: &Address) -> RegistryResult<bool> {
        Ok(self.topic(topic_id)?.has_voted(voter))
    }

    pub fn topic_state(&self, topic_id: u64, now: u64) -> RegistryResult<TopicState> {
        Ok(self.topic(topic_id)?.state_at(now))
    }

    /// Voters recorded on a topic, in address order.
    pub fn voters(&self, topic_id: u64) -> RegistryResult<Vec<Address>> {
        Ok(self.topic(topic_id)?.voters.keys().copied().collect())
    }

    fn topic_mut(&mut self, topic_id: u64) -> RegistryResult<&mut Topic> {
        usize::try_from(topic_id)
            .ok()
            .and_then(|index| self.topics.get_mut(index))
            .ok_or(RegistryError::UnknownTopic(topic_id))
    }

    fn emit(&self, event: RegistryEvent) {
        for sink in &self.sinks {
            sink.notify(&event);
        }
    }
}

fn validate_topic(request: &CreateTopic, now: u64) -> RegistryResult<()> {
    if request.options.is_empty() {
        return Err(RegistryError::InvalidTopic(
            "a topic needs at least one option".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(request.options.len());
    for (index, label) in request.options.iter().enumerate() {
        if label.trim().is_empty() {
            return Err(RegistryError::InvalidTopic(format!(
                "option {} is empty",
                index
            )));
        }
        if !seen.insert(label.as_str()) {
            return Err(RegistryError::InvalidTopic(format!(
                "duplicate option '{}'",
                label
            )));
        }
    }

    if request.end_time <= now {
        return Err(RegistryError::InvalidTopic(format!(
            "end time {} is not after current time {}",
            request.end_time, now
        )));
    }

    if request.token.is_zero() {
        return Err(RegistryError::InvalidTopic(
            "token address must not be zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_restored(position: usize, topic: &Topic) -> RegistryResult<()> {
    let corrupt = |reason: String| Err(RegistryError::CorruptSnapshot(reason));

    if usize::try_from(topic.id).ok() != Some(position) {
        return corrupt(format!("topic at position {} has id {}", position, topic.id));
    }

    if topic.vote_counts.len() != topic.options.len() {
        return corrupt(format!(
            "topic {} has {} options but {} vote counts",
            topic.id,
            topic.options.len(),
            topic.vote_counts.len()
        ));
    }

    let mut seen = HashSet::with_capacity(topic.options.len());
    for label in &topic.options {
        if !seen.insert(label.as_str()) {
            return corrupt(format!("topic {} repeats option '{}'", topic.id, label));
        }
    }

    if let Some((voter, record)) = topic
        .voters
        .iter()
        .find(|(_, record)| record.option_index >= topic.options.len())
    {
        return corrupt(format!(
            "voter {} on topic {} chose option index {}",
            voter, topic.id, record.option_index
        ));
    }

    if !topic.finalized && topic.vote_counts.iter().any(|count| *count != 0) {
        return corrupt(format!(
            "topic {} has vote counts but is not finalized",
            topic.id
        ));
    }

    Ok(())
}

fn tally(
    option_count: usize,
    voters: &BTreeMap<Address, VoterRecord>,
    weighting: WeightPolicy,
    balances: &HashMap<Address, u128>,
) -> Vec<u128> {
    let mut tallies = vec![0u128; option_count];
    for (voter, record) in voters {
        let weight = match weighting {
            WeightPolicy::BalanceAtFinalization => balances.get(voter).copied(),
            WeightPolicy::BalanceAtVote => record.weight_snapshot,
        };
        let weight = weight.unwrap_or_else(|| {
            debug!(voter = %voter, "no balance for voter, counting as 0");
            0
        });
        tallies[record.option_index] = tallies[record.option_index].saturating_add(weight);
    }
    tallies
}
