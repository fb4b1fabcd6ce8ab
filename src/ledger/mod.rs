//! Ledger access for the registry.
//!
//! This module provides:
//! - The [`LedgerClient`] trait (block time + token balances)
//! - A mock implementation for tests
//! - A configured offline implementation for the CLI
//! - Retry with exponential backoff for transient transport failures

pub mod configured;
pub mod mock;
pub mod retry;
pub mod traits;

pub use configured::{ConfiguredLedger, LedgerClock};
pub use mock::MockLedger;
pub use retry::{retry_with_backoff, RetryPolicy, RetryingLedger};
pub use traits::{LedgerClient, LedgerError, LedgerResult};
