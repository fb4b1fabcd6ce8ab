//! Trait abstraction for ledger reads.
//!
//! The registry needs two things from the chain: the current block time and
//! token balances. Both come through [`LedgerClient`] so tests can use
//! [`MockLedger`](super::mock::MockLedger) and the CLI can use a configured
//! offline ledger.

use crate::address::Address;
use async_trait::async_trait;
use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Transient transport failure (timeout, dropped connection). Retryable.
    #[error("Ledger transport error: {0}")]
    Transport(String),

    /// The token contract is not known to the ledger.
    #[error("Unknown token: {0}")]
    UnknownToken(Address),

    #[error("{0}")]
    Other(String),
}

impl LedgerError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Read access to the ledger backing the registry.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Timestamp of the latest block, in Unix seconds.
    async fn block_timestamp(&self) -> LedgerResult<u64>;

    /// Balance of `holder` in `token`.
    async fn balance_of(&self, token: &Address, holder: &Address) -> LedgerResult<u128>;
}
