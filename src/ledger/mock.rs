//! Mock ledger for testing.
//!
//! Settable block time and balances, plus injectable transient failures for
//! exercising retry paths.

use super::traits::*;
use crate::address::Address;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Mock ledger for testing.
#[derive(Clone)]
pub struct MockLedger {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    now: u64,
    tokens: HashSet<Address>,
    balances: HashMap<(Address, Address), u128>,
    /// Number of upcoming calls that fail with a transport error.
    pending_failures: u32,
    calls: u32,
}

impl MockLedger {
    /// Create a mock ledger whose clock reads `now`.
    pub fn new(now: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                now,
                ..Default::default()
            })),
        }
    }

    pub fn set_time(&self, now: u64) {
        self.state.lock().unwrap().now = now;
    }

    /// Move the clock forward by `secs`.
    pub fn advance(&self, secs: u64) {
        let mut state = self.state.lock().unwrap();
        state.now = state.now.saturating_add(secs);
    }

    pub fn now(&self) -> u64 {
        self.state.lock().unwrap().now
    }

    /// Register a token with zero balances.
    pub fn add_token(&self, token: Address) {
        self.state.lock().unwrap().tokens.insert(token);
    }

    /// Set a balance (registers the token if needed).
    pub fn set_balance(&self, token: Address, holder: Address, amount: u128) {
        let mut state = self.state.lock().unwrap();
        state.tokens.insert(token);
        state.balances.insert((token, holder), amount);
    }

    /// Make the next `count` calls fail with [`LedgerError::Transport`].
    pub fn fail_next(&self, count: u32) {
        self.state.lock().unwrap().pending_failures = count;
    }

    /// Total calls received, failed ones included.
    pub fn calls(&self) -> u32 {
        self.state.lock().unwrap().calls
    }

    fn begin_call(state: &mut MockState) -> LedgerResult<()> {
        state.calls += 1;
        if state.pending_failures > 0 {
            state.pending_failures -= 1;
            return Err(LedgerError::Transport("mock transport failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn block_timestamp(&self) -> LedgerResult<u64> {
        let mut state = self.state.lock().unwrap();
        Self::begin_call(&mut state)?;
        Ok(state.now)
    }

    async fn balance_of(&self, token: &Address, holder: &Address) -> LedgerResult<u128> {
        let mut state = self.state.lock().unwrap();
        Self::begin_call(&mut state)?;

        if !state.tokens.contains(token) {
            return Err(LedgerError::UnknownToken(*token));
        }
        Ok(state
            .balances
            .get(&(*token, *holder))
            .copied()
            .unwrap_or(0))
    }
}
