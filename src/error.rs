//! Error types for the buoy client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use buoy_client::{Listener, Result};
//!
//! async fn example() -> Result<()> {
//!     let message = Listener::builder()
//!         .service("https://cb.anchor.link")
//!         .channel("my-channel-id")
//!         .receive(Default::default())
//!         .await?;
//!     println!("{message}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants | Code |
//! |----------|----------|------|
//! | Configuration | [`Error::Config`], [`Error::InvalidUrl`] | `E_CONFIG` |
//! | Socket | [`Error::Socket`] | `E_NETWORK` |
//! | Message | [`Error::Message`], [`Error::TimedOut`], [`Error::Cancelled`] | `E_MESSAGE` |
//! | Listener | [`Error::ListenerClosed`] | `E_CLOSED` |
//! | Delivery | [`Error::Undeliverable`], [`Error::RequestCancelled`], [`Error::UnexpectedStatus`], [`Error::Http`] | `E_DELIVERY` |
//!
//! Socket errors are recoverable: the listener reconnects on its own and
//! they are safe to ignore. Everything else is final for the operation it
//! belongs to (a single frame, a single receive, a single send).
//!
//! The enum is `Clone` because errors travel to every listener subscriber.

// ============================================================================
// Imports
// ============================================================================

use std::error::Error as StdError;
use std::result::Result as StdResult;
use std::sync::Arc;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

/// Shared, cloneable underlying cause.
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug, Clone)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned synchronously when options are missing or invalid,
    /// before any I/O happens.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A derived channel URL failed to parse.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ========================================================================
    // Socket Errors
    // ========================================================================
    /// Network error on the listener socket.
    ///
    /// Recoverable: a close always follows and drives the reconnect.
    #[error("Socket error: {message}")]
    Socket {
        /// Description reported by the transport.
        message: String,
    },

    // ========================================================================
    // Message Errors
    // ========================================================================
    /// An inbound message could not be read or decoded.
    ///
    /// Only the offending frame is dropped, the connection stays up.
    #[error("{reason}")]
    Message {
        /// What went wrong.
        reason: String,
        /// Underlying decoder error, if any.
        #[source]
        source: Option<Cause>,
    },

    /// A receive call timed out before a message arrived.
    #[error("Timed out")]
    TimedOut {
        /// Last recoverable error seen while waiting.
        last_error: Option<Box<Error>>,
    },

    /// A receive call was cancelled before a message arrived.
    #[error("Cancelled")]
    Cancelled {
        /// Last recoverable error seen while waiting.
        last_error: Option<Box<Error>>,
    },

    // ========================================================================
    // Listener Errors
    // ========================================================================
    /// The listener task stopped while someone was still waiting on it.
    #[error("Listener closed")]
    ListenerClosed,

    // ========================================================================
    // Delivery Errors
    // ========================================================================
    /// The relay could not deliver the message within the wait window (408).
    #[error("Unable to deliver message")]
    Undeliverable,

    /// The relay cancelled the delivery request (410).
    ///
    /// Happens when a newer message replaces this one on the channel.
    #[error("Request cancelled")]
    RequestCancelled,

    /// The relay answered with an unexpected non-2xx status.
    #[error("Unexpected status code {status}")]
    UnexpectedStatus {
        /// HTTP status code returned.
        status: u16,
    },

    /// The delivery request failed before a response arrived.
    #[error("HTTP error: {message}")]
    Http {
        /// Description of the HTTP failure.
        message: String,
    },
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a socket error.
    #[inline]
    pub fn socket(message: impl Into<String>) -> Self {
        Self::Socket {
            message: message.into(),
        }
    }

    /// Creates a message error without an underlying cause.
    #[inline]
    pub fn message(reason: impl Into<String>) -> Self {
        Self::Message {
            reason: reason.into(),
            source: None,
        }
    }

    /// Creates a message error wrapping an underlying cause.
    #[inline]
    pub fn message_with_source(
        reason: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Message {
            reason: reason.into(),
            source: Some(Arc::new(source)),
        }
    }

    /// Creates a receive timeout error.
    #[inline]
    pub fn timed_out(last_error: Option<Error>) -> Self {
        Self::TimedOut {
            last_error: last_error.map(Box::new),
        }
    }

    /// Creates a receive cancellation error.
    #[inline]
    pub fn cancelled(last_error: Option<Error>) -> Self {
        Self::Cancelled {
            last_error: last_error.map(Box::new),
        }
    }

    /// Creates an unexpected status error.
    #[inline]
    pub fn unexpected_status(status: u16) -> Self {
        Self::UnexpectedStatus { status }
    }

    /// Creates an HTTP error.
    #[inline]
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error is recoverable.
    ///
    /// Only socket errors are: the listener heals itself by reconnecting.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Socket { .. })
    }

    /// Returns `true` if this is a message error.
    #[inline]
    #[must_use]
    pub fn is_message_error(&self) -> bool {
        matches!(
            self,
            Self::Message { .. } | Self::TimedOut { .. } | Self::Cancelled { .. }
        )
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Returns `true` if this is a cancellation error.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns `true` if this error comes from a delivery request.
    #[inline]
    #[must_use]
    pub fn is_delivery_error(&self) -> bool {
        matches!(
            self,
            Self::Undeliverable
                | Self::RequestCancelled
                | Self::UnexpectedStatus { .. }
                | Self::Http { .. }
        )
    }

    /// Returns the last recoverable error attached to a timeout or cancellation.
    #[inline]
    #[must_use]
    pub fn last_error(&self) -> Option<&Error> {
        match self {
            Self::TimedOut { last_error } | Self::Cancelled { last_error } => {
                last_error.as_deref()
            }
            _ => None,
        }
    }

    /// Returns the stable error code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } | Self::InvalidUrl(_) => "E_CONFIG",
            Self::Socket { .. } => "E_NETWORK",
            Self::Message { .. } | Self::TimedOut { .. } | Self::Cancelled { .. } => "E_MESSAGE",
            Self::ListenerClosed => "E_CLOSED",
            Self::Undeliverable
            | Self::RequestCancelled
            | Self::UnexpectedStatus { .. }
            | Self::Http { .. } => "E_DELIVERY",
        }
    }
}

// ============================================================================
// External Conversions
// ============================================================================

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::http(err.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
