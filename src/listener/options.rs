//! Listener timing configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use buoy_client::ListenerTimings;
//!
//! let timings = ListenerTimings::new()
//!     .with_keepalive_interval(Duration::from_secs(60))
//!     .with_heartbeat_timeout(Duration::from_secs(30));
//!
//! assert!(timings.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

use super::backoff::Backoff;

// ============================================================================
// Constants
// ============================================================================

/// Forced reconnect interval (10 minutes).
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Maximum silence between transport pings before terminating (15s).
///
/// The relay pings every 10 seconds.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(15);

/// How long a graceful close may take before the socket is dropped.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default capacity of the listener event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

// ============================================================================
// ListenerTimings
// ============================================================================

/// Timer configuration of a [`Listener`](crate::Listener).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerTimings {
    /// Close and reopen the connection this often. Zero disables it.
    pub keepalive_interval: Duration,

    /// Terminate the connection if no transport ping arrives within this
    /// window after the previous one. Zero disables it.
    pub heartbeat_timeout: Duration,

    /// Grace period for the closing handshake.
    pub close_timeout: Duration,

    /// Reconnect delay policy.
    pub backoff: Backoff,
}

impl Default for ListenerTimings {
    fn default() -> Self {
        Self {
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            backoff: Backoff::default(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ListenerTimings {
    /// Creates timings with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the forced reconnect interval.
    #[inline]
    #[must_use]
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Sets the heartbeat timeout.
    #[inline]
    #[must_use]
    pub fn with_heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.heartbeat_timeout = timeout;
        self
    }

    /// Sets the closing handshake grace period.
    #[inline]
    #[must_use]
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Sets the reconnect backoff.
    #[inline]
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ListenerTimings {
    /// Returns the keepalive interval, or `None` if disabled.
    #[inline]
    #[must_use]
    pub fn keepalive(&self) -> Option<Duration> {
        (!self.keepalive_interval.is_zero()).then_some(self.keepalive_interval)
    }

    /// Returns the heartbeat timeout, or `None` if disabled.
    #[inline]
    #[must_use]
    pub fn heartbeat(&self) -> Option<Duration> {
        (!self.heartbeat_timeout.is_zero()).then_some(self.heartbeat_timeout)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the close timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.close_timeout.is_zero() {
            return Err(Error::config("Close timeout must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
