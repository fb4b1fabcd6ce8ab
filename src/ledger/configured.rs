//! Offline ledger backed by operator configuration.
//!
//! Used by the CLI to simulate the contract without a node: time comes from
//! the system clock (or a pinned timestamp) and balances from a fixed table.
//! Holders missing from the table have a zero balance.

use super::traits::{LedgerClient, LedgerError, LedgerResult};
use crate::address::Address;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of block time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerClock {
    /// Wall clock.
    System,
    /// Pinned timestamp (Unix seconds).
    Fixed(u64),
}

/// Ledger with a configured clock and balance table.
#[derive(Debug, Clone)]
pub struct ConfiguredLedger {
    clock: LedgerClock,
    balances: HashMap<(Address, Address), u128>,
}

impl ConfiguredLedger {
    pub fn new(clock: LedgerClock) -> Self {
        Self {
            clock,
            balances: HashMap::new(),
        }
    }

    /// Add (or replace) a balance entry.
    pub fn with_balance(mut self, token: Address, holder: Address, amount: u128) -> Self {
        self.balances.insert((token, holder), amount);
        self
    }

    pub fn clock(&self) -> LedgerClock {
        self.clock
    }
}

#[async_trait]
impl LedgerClient for ConfiguredLedger {
    async fn block_timestamp(&self) -> LedgerResult<u64> {
        match self.clock {
            LedgerClock::Fixed(now) => Ok(now),
            LedgerClock::System => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .map_err(|e| LedgerError::Other(format!("System clock is before UNIX epoch: {}", e))),
        }
    }

    async fn balance_of(&self, token: &Address, holder: &Address) -> LedgerResult<u128> {
        let balance = self.balances.get(&(*token, *holder)).copied();
        if balance.is_none() {
            tracing::debug!(token = %token, holder = %holder, "no configured balance, using 0");
        }
        Ok(balance.unwrap_or(0))
    }
}
