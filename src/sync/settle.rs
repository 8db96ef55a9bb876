//! Wait for the backend's write path to settle, then confirm the write landed.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::backend::BackendResult;

/// How long to wait and how often to look before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    /// Wait before the first verification read.
    pub settle_delay: Duration,
    /// Total verification reads, at least 1.
    pub attempts: u32,
    /// Wait between verification reads after the first.
    pub retry_interval: Duration,
}

impl SettlePolicy {
    /// A single read after the delay, with no further retries.
    pub fn once(settle_delay: Duration) -> Self {
        Self {
            settle_delay,
            attempts: 1,
            retry_interval: Duration::ZERO,
        }
    }
}

/// Outcome of [`settle_and_verify`].
#[derive(Debug, Clone, PartialEq)]
pub enum Verification<T> {
    Verified(T),
    /// Nothing matched after every attempt. Local state can no longer be
    /// trusted and the consumer must reload it in full.
    ReloadRequired,
}

/// Sleep for the settle delay, then read with `fetch` and look for a match
/// with `predicate`, up to `policy.attempts` times.
///
/// Read errors abort immediately; only a missing match is retried.
pub async fn settle_and_verify<C, T, F, Fut, P>(
    policy: &SettlePolicy,
    mut fetch: F,
    mut predicate: P,
) -> BackendResult<Verification<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BackendResult<C>>,
    P: FnMut(C) -> Option<T>,
{
    sleep(policy.settle_delay).await;

    let attempts = policy.attempts.max(1);
    for attempt in 1..=attempts {
        if let Some(found) = predicate(fetch().await?) {
            debug!("Verified on attempt {}/{}", attempt, attempts);
            return Ok(Verification::Verified(found));
        }

        if attempt < attempts {
            debug!(
                "Not visible yet (attempt {}/{}), retrying in {:?}",
                attempt, attempts, policy.retry_interval
            );
            sleep(policy.retry_interval).await;
        }
    }

    warn!("Verification failed after {} attempt(s)", attempts);
    Ok(Verification::ReloadRequired)
}
