//! Reconnect backoff policy.
//!
//! Delays grow geometrically from `base` by `multiplier` per attempt and are
//! clamped to `cap`. After `max_attempts` consecutive failures the connection
//! stops retrying.

use std::time::Duration;

/// Immutable reconnect configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    base: Duration,
    multiplier: u32,
    cap: Duration,
    max_attempts: u32,
}

impl ReconnectPolicy {
    /// Default first retry delay.
    pub const DEFAULT_BASE: Duration = Duration::from_millis(1_000);
    /// Default growth factor per attempt.
    pub const DEFAULT_MULTIPLIER: u32 = 2;
    /// Default upper bound on any single delay.
    pub const DEFAULT_CAP: Duration = Duration::from_millis(30_000);
    /// Default number of reconnect attempts before giving up.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

    /// Create a policy.
    pub fn new(base: Duration, multiplier: u32, cap: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            multiplier,
            cap,
            max_attempts,
        }
    }

    /// A policy that never schedules reconnects.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// First retry delay.
    pub fn base(&self) -> Duration {
        self.base
    }

    /// Growth factor per attempt.
    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Upper bound on any single delay.
    pub fn cap(&self) -> Duration {
        self.cap
    }

    /// Number of reconnect attempts allowed after a failure.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether any reconnect will ever be scheduled.
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Delay before the given 1-based reconnect attempt.
    ///
    /// `min(base * multiplier^(attempt - 1), cap)`; attempt 0 is treated as 1.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let base_ms = self.base.as_millis();
        let scaled_ms = self
            .multiplier
            .checked_pow(exponent)
            .and_then(|factor| base_ms.checked_mul(u128::from(factor)))
            .unwrap_or(u128::MAX);
        let capped_ms = scaled_ms.min(self.cap.as_millis());
        Duration::from_millis(u64::try_from(capped_ms).unwrap_or(u64::MAX))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_BASE,
            Self::DEFAULT_MULTIPLIER,
            Self::DEFAULT_CAP,
            Self::DEFAULT_MAX_ATTEMPTS,
        )
    }
}
