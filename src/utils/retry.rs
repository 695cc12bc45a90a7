//! Exponential backoff for per-item retries.

use std::time::Duration;

use crate::models::EnrichConfig;

/// Attempt ceiling plus a doubling wait clamped between a floor and a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Total attempts, including the first
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&EnrichConfig::default())
    }
}

impl From<&EnrichConfig> for BackoffPolicy {
    fn from(config: &EnrichConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl BackoffPolicy {
    /// Policy that retries without sleeping.
    pub fn immediate(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Wait before the retry that follows failed attempt `attempt_index` (0-based).
    pub fn delay_for_attempt(&self, attempt_index: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt_index as u32).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor);
        delay.max(self.min_delay).min(self.max_delay)
    }
}
