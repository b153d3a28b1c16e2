//! Listener lifecycle events and connection state.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::error::Error;
use crate::protocol::Message;

// ============================================================================
// ListenerEvent
// ============================================================================

/// An event published to every listener subscriber.
#[derive(Debug, Clone)]
pub enum ListenerEvent {
    /// A socket opened.
    Connected,
    /// A socket closed, for any reason.
    Disconnected,
    /// One decoded payload.
    Message(Message),
    /// A socket error (recoverable) or message error (frame dropped).
    Error(Error),
}

impl ListenerEvent {
    /// Returns the message if this is a message event.
    #[inline]
    #[must_use]
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(message) => Some(message),
            _ => None,
        }
    }

    /// Returns the error if this is an error event.
    #[inline]
    #[must_use]
    pub fn as_error(&self) -> Option<&Error> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }
}

// ============================================================================
// ConnectionState
// ============================================================================

/// Where the listener's connection cycle currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Not active, no socket.
    #[default]
    Inactive,
    /// Opening a socket or waiting to retry.
    Connecting,
    /// Socket open.
    Connected,
    /// Closing handshake in progress.
    Closing,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inactive => "inactive",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
        };
        f.write_str(name)
    }
}
