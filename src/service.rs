//! Async registry service.
//!
//! Wraps a [`VotingRegistry`] behind a single `tokio::sync::Mutex` and feeds
//! it block time and balances from a [`LedgerClient`]. Every write holds the
//! lock for its whole duration, ledger reads included, so create, vote and
//! finalize never interleave. Reads copy what they need and release the lock.

use crate::address::Address;
use crate::ledger::{LedgerClient, LedgerError};
use crate::registry::{
    CreateTopic, EventSink, RegistryError, RegistrySnapshot, TopicDetails, TopicState,
    VotingRegistry, WeightPolicy,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service errors: a registry rejection or a ledger failure.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ServiceError {
    /// The registry rejection, if this is one.
    pub fn as_registry(&self) -> Option<&RegistryError> {
        match self {
            Self::Registry(e) => Some(e),
            Self::Ledger(_) => None,
        }
    }
}

/// Registry plus the ledger it reads from.
pub struct RegistryService<L> {
    registry: Arc<Mutex<VotingRegistry>>,
    ledger: L,
}

impl<L> Clone for RegistryService<L>
where
    L: Clone,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            ledger: self.ledger.clone(),
        }
    }
}

impl<L: LedgerClient> RegistryService<L> {
    pub fn new(registry: VotingRegistry, ledger: L) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
            ledger,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Register an observer on the wrapped registry.
    pub async fn subscribe<S: EventSink + 'static>(&self, sink: S) {
        self.registry.lock().await.subscribe(sink);
    }

    /// Create a topic at the current block time.
    pub async fn create_topic(&self, caller: &Address, request: CreateTopic) -> ServiceResult<u64> {
        let mut registry = self.registry.lock().await;
        let now = self.ledger.block_timestamp().await?;
        Ok(registry.create_topic(caller, now, request)?)
    }

    /// Cast `caller`'s vote at the current block time.
    ///
    /// Under [`WeightPolicy::BalanceAtVote`] the caller's balance is read
    /// before the vote is recorded, but only when the vote can succeed.
    pub async fn vote(&self, caller: &Address, topic_id: u64, option: &str) -> ServiceResult<()> {
        let mut registry = self.registry.lock().await;
        let now = self.ledger.block_timestamp().await?;

        let snapshot_token = match registry.policy().weighting {
            WeightPolicy::BalanceAtVote => registry
                .topic(topic_id)
                .ok()
                .filter(|t| now < t.end_time && t.option_index(option).is_some())
                .filter(|t| !t.has_voted(caller))
                .map(|t| t.token),
            WeightPolicy::BalanceAtFinalization => None,
        };

        let weight = match snapshot_token {
            Some(token) => Some(self.ledger.balance_of(&token, caller).await?),
            None => None,
        };

        Ok(registry.vote(caller, now, topic_id, option, weight)?)
    }

    /// Finalize a topic at the current block time.
    ///
    /// All preconditions are checked before any balance is fetched. Under
    /// [`WeightPolicy::BalanceAtFinalization`] every voter's balance is read
    /// from the topic's token.
    pub async fn finalize_votes(&self, caller: &Address, topic_id: u64) -> ServiceResult<Vec<u128>> {
        let mut registry = self.registry.lock().await;
        let now = self.ledger.block_timestamp().await?;

        let (token, voters) = {
            let topic = registry.check_finalizable(caller, now, topic_id)?;
            (topic.token, topic.voters.keys().copied().collect::<Vec<_>>())
        };

        let mut balances = HashMap::with_capacity(voters.len());
        if registry.policy().weighting == WeightPolicy::BalanceAtFinalization {
            for voter in voters {
                let balance = self.ledger.balance_of(&token, &voter).await?;
                debug!(topic_id, voter = %voter, balance = %balance, "voter balance");
                balances.insert(voter, balance);
            }
        }

        Ok(registry.finalize_votes(caller, now, topic_id, &balances)?)
    }

    pub async fn get_topic_details(&self, topic_id: u64) -> ServiceResult<TopicDetails> {
        Ok(self.registry.lock().await.get_topic_details(topic_id)?)
    }

    pub async fn get_votes(&self, topic_id: u64, option: &str) -> ServiceResult<u128> {
        Ok(self.registry.lock().await.get_votes(topic_id, option)?)
    }

    pub async fn get_topic_count(&self) -> u64 {
        self.registry.lock().await.get_topic_count()
    }

    pub async fn has_voted(&self, topic_id: u64, voter: &Address) -> ServiceResult<bool> {
        Ok(self.registry.lock().await.has_voted(topic_id, voter)?)
    }

    pub async fn owner(&self) -> Address {
        self.registry.lock().await.owner()
    }

    /// Topic state at the current block time.
    pub async fn topic_state(&self, topic_id: u64) -> ServiceResult<TopicState> {
        let now = self.ledger.block_timestamp().await?;
        Ok(self.registry.lock().await.topic_state(topic_id, now)?)
    }

    /// Copy of the full registry contents.
    pub async fn snapshot(&self) -> RegistrySnapshot {
        self.registry.lock().await.snapshot()
    }
}
