//! Retry policy for the send loop.
//!
//! A send gets a fixed number of attempts. Between attempts the pool is
//! rebuilt, optionally after an exponential backoff pause.

use super::config::ManagerConfig;
use std::time::Duration;

/// Attempt bound and pause schedule for [`BrokerManager::send`](super::BrokerManager::send).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per send, including the first (values below 1 count as 1)
    pub iterations: usize,
    /// Base delay before the first retry in milliseconds (default: 0, no pause)
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds (default: 5000)
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            iterations: 1,
            base_delay_ms: 0,
            max_delay_ms: 5000,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ManagerConfig) -> Self {
        Self {
            iterations: config.iterations,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }

    /// Number of attempts a send will make.
    pub fn attempts(&self) -> usize {
        self.iterations.max(1)
    }

    /// Whether `attempt` (zero-based) is the final one.
    pub fn is_last(&self, attempt: usize) -> bool {
        attempt + 1 >= self.attempts()
    }

    /// Pause before the `retry`-th retry (one-based).
    pub fn backoff(&self, retry: usize) -> Duration {
        calculate_backoff(retry, self)
    }
}

/// Calculate backoff delay for a given retry.
///
/// Uses exponential backoff: `base_delay * 2^(retry-1)`, capped at `max_delay_ms`.
pub fn calculate_backoff(retry: usize, policy: &RetryPolicy) -> Duration {
    if retry == 0 || policy.base_delay_ms == 0 {
        return Duration::ZERO;
    }

    let delay_ms = policy
        .base_delay_ms
        .saturating_mul(1 << (retry - 1).min(10));
    Duration::from_millis(delay_ms.min(policy.max_delay_ms))
}
