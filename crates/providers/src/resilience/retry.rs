//! Bounded retry with exponential backoff.
//!
//! The policy itself is pure configuration plus delay arithmetic; the
//! retry loop lives in [`ResilientProvider`](super::ResilientProvider).

use std::time::Duration;

/// Default number of extra attempts after the first failure.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff unit: with a one-second base, attempt `n` waits
/// `2^n` seconds.
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Retry policy for transient upstream failures.
///
/// Only errors classified [`RetryClass::Transient`](crate::errors::RetryClass)
/// are retried; validation and business failures surface immediately.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Maximum retry attempts after the initial call.
    pub max_attempts: u32,
    /// Backoff unit; the delay before attempt `n` is `base_delay * 2^n`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    /// The backoff delay before retry attempt `attempt` (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        // Shift capped well below any realistic attempt count.
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}
