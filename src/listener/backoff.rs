//! Reconnect backoff.
//!
//! Delays grow quadratically with the retry count and cap out:
//!
//! ```text
//! delay(n) = min((factor * n)², max)      factor = 7, max = 5s
//! ```
//!
//! | n | 0 | 1 | 2 | 3 | 5 | 10 | 11+ |
//! |---|---|---|---|---|---|----|-----|
//! | ms | 0 | 49 | 196 | 441 | 1225 | 4900 | 5000 |
//!
//! The first retry after a healthy connection is immediate.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default growth factor.
const DEFAULT_FACTOR: u64 = 7;

/// Default delay cap.
const DEFAULT_MAX: Duration = Duration::from_secs(5);

// ============================================================================
// Backoff
// ============================================================================

/// Retry counter with a capped quadratic delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    factor: u64,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    /// Creates a backoff with a custom factor and cap.
    #[inline]
    #[must_use]
    pub const fn new(factor: u64, max: Duration) -> Self {
        Self {
            factor,
            max,
            attempt: 0,
        }
    }

    /// Returns the delay for a given retry count, without touching the counter.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let step = u64::from(attempt).saturating_mul(self.factor);
        let millis = step.saturating_mul(step);
        Duration::from_millis(millis).min(self.max)
    }

    /// Returns the delay for the current retry and increments the counter.
    #[must_use]
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delay_for(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Resets the retry counter; called after every successful open.
    #[inline]
    pub const fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Returns the current retry count.
    #[inline]
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the delay cap.
    #[inline]
    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_FACTOR, DEFAULT_MAX)
    }
}

/// Default reconnect delay for a retry count.
#[inline]
#[must_use]
pub fn delay(attempt: u32) -> Duration {
    Backoff::default().delay_for(attempt)
}

// ============================================================================
// Tests
// ============================================================================
