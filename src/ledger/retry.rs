//! Ledger retry with exponential backoff.
//!
//! Retrying belongs to the ledger side: the registry never retries a
//! rejected call. Only transient transport failures are retried
//! (see [`LedgerError::is_retryable`]).
//!
//! Wrap networked [`LedgerClient`]s in [`RetryingLedger`]. The CLI's
//! `ConfiguredLedger` never fails transiently and is used unwrapped.

use super::traits::{LedgerClient, LedgerError, LedgerResult};
use crate::address::Address;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Backoff settings.
///
/// Delay before retry `n` (0-based) is `base_delay * 2^n`, capped at
/// `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following failed attempt `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Retry an async operation while `is_retryable` says the error is transient.
///
/// Returns the first success, or the last error once retries run out.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !is_retryable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }

                let backoff = policy.backoff(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "ledger call failed, retrying"
                );

                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

/// [`LedgerClient`] wrapper that retries transient failures.
#[derive(Clone)]
pub struct RetryingLedger<L> {
    inner: L,
    policy: RetryPolicy,
}

impl<L: LedgerClient> RetryingLedger<L> {
    pub fn new(inner: L, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: LedgerClient> LedgerClient for RetryingLedger<L> {
    async fn block_timestamp(&self) -> LedgerResult<u64> {
        retry_with_backoff(
            &self.policy,
            || self.inner.block_timestamp(),
            LedgerError::is_retryable,
        )
        .await
    }

    async fn balance_of(&self, token: &Address, holder: &Address) -> LedgerResult<u128> {
        retry_with_backoff(
            &self.policy,
            || self.inner.balance_of(token, holder),
            LedgerError::is_retryable,
        )
        .await
    }
}
