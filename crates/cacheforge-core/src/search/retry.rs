//! Bounded retry policy for build failures.
//!
//! Stateless like the rest of the decision logic: the controller tracks the
//! attempt count and asks this policy whether and when to regenerate.

use std::time::Duration;

use cacheforge_types::config::BuildRetryConfig;

/// Decides whether a failed build may be regenerated and how long to wait.
#[derive(Debug, Clone)]
pub struct BuildRetryPolicy {
    config: BuildRetryConfig,
}

impl BuildRetryPolicy {
    pub fn new(config: BuildRetryConfig) -> Self {
        Self { config }
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_build_attempts
    }

    /// `attempt` is 1-based: the first build at an iteration index is attempt 1.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.config.max_build_attempts
    }

    /// Delay before the attempt following `attempt`: the base delay doubled
    /// for every earlier failure, capped at `max_backoff_ms`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let ms = self
            .config
            .backoff_ms
            .saturating_mul(1u64 << exponent)
            .min(self.config.max_backoff_ms);
        Duration::from_millis(ms)
    }
}
