//! Retry policy for the optimistic updater
//!
//! Bounded attempts with capped exponential backoff. With `base_delay_ms ==
//! max_delay_ms` the delay is fixed, which is the default (10 attempts, 50ms).
//! Attempts, not delays, bound how many contenders are sure to commit; see
//! [`RetryConfig::covers_contenders`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for conflict retries
///
/// # Example
///
/// ```
/// use stockguard_concurrency::RetryConfig;
///
/// let config = RetryConfig::new()
///     .with_max_attempts(20)
///     .with_base_delay_ms(1)
///     .with_max_delay_ms(8);
/// assert_eq!(config.max_attempts, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first (at least 1)
    pub max_attempts: usize,
    /// Delay after the first failed attempt, in milliseconds
    pub base_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds
    pub max_delay_ms: u64,
    /// Add a random extra of up to the computed delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay_ms: 50,
            max_delay_ms: 50,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Create a new RetryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Set total attempts
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set base delay for exponential backoff
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set maximum delay between attempts
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Attempts actually made; a zero setting still makes one attempt.
    pub fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }

    /// Whether `contenders` concurrent adjustments of one record are all
    /// guaranteed to commit, given enough stock.
    ///
    /// Every conflict means some other contender committed in between, so a
    /// caller fails at most once per rival. Jitter and backoff spread the
    /// retries out but do not raise this bound.
    pub fn covers_contenders(&self, contenders: usize) -> bool {
        contenders <= self.attempts()
    }

    /// Delay before retrying after failed attempt `attempt` (0-based).
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        // Cap the shift to prevent overflow (1 << 63 is the max for u64)
        let shift = attempt.min(63);
        let multiplier = 1u64 << shift;
        let delay_ms = self
            .base_delay_ms
            .saturating_mul(multiplier)
            .min(self.max_delay_ms);
        if self.jitter && delay_ms > 0 {
            let extra = rand::thread_rng().gen_range(0..=delay_ms);
            Duration::from_millis(delay_ms + extra)
        } else {
            Duration::from_millis(delay_ms)
        }
    }
}
