//! Retry schedule for records whose probe failed transiently.

use std::time::Duration;

/// Ceiling for a single backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retry rounds after the first pass; 0 disables retries
    pub max_retries: u32,

    /// Sleep before the first retry round
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_backoff: Duration::ZERO,
        }
    }

    pub fn exponential(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
        }
    }

    /// Sleep before retry `round` (0-based): base * 2^round, capped.
    pub fn backoff_for(&self, round: u32) -> Duration {
        let factor = 1u32.checked_shl(round).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
