//! Registry policies.
//!
//! Two behaviours of the deployed contract are not pinned down by anything the
//! contract's callers can observe: who may create and finalize topics, and
//! when a voter's token balance is read. Both are explicit, serializable
//! policies chosen when the registry is created.

use crate::address::Address;
use serde::{Deserialize, Serialize};

/// Who may call the owner-gated operations (`create_topic`, `finalize_votes`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthorizationPolicy {
    /// Only the registry owner.
    #[default]
    OwnerOnly,
    /// Any caller.
    Open,
}

impl AuthorizationPolicy {
    /// Check whether `caller` may perform an owner-gated operation.
    pub fn permits(&self, owner: &Address, caller: &Address) -> bool {
        match self {
            Self::OwnerOnly => owner == caller,
            Self::Open => true,
        }
    }
}

/// When a voter's token balance is turned into vote weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightPolicy {
    /// Balances are read once, when the topic is finalized.
    #[default]
    BalanceAtFinalization,
    /// Balances are snapshotted when each vote is cast.
    BalanceAtVote,
}

/// Combined registry policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryPolicy {
    #[serde(default)]
    pub authorization: AuthorizationPolicy,
    #[serde(default)]
    pub weighting: WeightPolicy,
}
