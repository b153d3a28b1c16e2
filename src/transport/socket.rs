//! Transport capability traits.
//!
//! A [`Transport`] opens sockets; a [`Socket`] is one live duplex
//! connection. Implementations normalize every inbound representation
//! (text or binary WebSocket messages, in-memory buffers) into
//! [`Bytes`] before the listener ever looks at it.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Normal-closure code used for caller-driven and keepalive closes.
pub const NORMAL_CLOSURE: u16 = 1000;

// ============================================================================
// Types
// ============================================================================

/// Boxed socket handed out by a [`Transport`].
pub type BoxSocket = Box<dyn Socket>;

// ============================================================================
// SocketEvent
// ============================================================================

/// A notification from an open socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// An inbound frame, already normalized to bytes.
    Frame(Bytes),
    /// A low-level (transport) ping was received.
    Ping,
    /// A transport error. Not terminal by itself.
    Error(String),
    /// The socket closed, with the close code if one was received.
    Closed(Option<u16>),
}

// ============================================================================
// Transport
// ============================================================================

/// Opens sockets to a URL.
///
/// Injected into a [`Listener`](crate::Listener) at construction.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Opens a new socket. Success means the socket is open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Socket`](crate::Error::Socket) if the connection
    /// cannot be established.
    async fn open(&self, url: &Url) -> Result<BoxSocket>;
}

// ============================================================================
// Socket
// ============================================================================

/// One open duplex connection.
///
/// # Cancel Safety
///
/// [`next_event`](Socket::next_event) is polled inside `tokio::select!`
/// and must not lose notifications when its future is dropped early.
#[async_trait]
pub trait Socket: Send {
    /// Waits for the next notification.
    ///
    /// `None` means the socket is gone; it is handled like
    /// [`SocketEvent::Closed`].
    async fn next_event(&mut self) -> Option<SocketEvent>;

    /// Sends one binary frame.
    async fn send(&mut self, frame: Bytes) -> Result<()>;

    /// Starts a graceful close with the given code.
    async fn close(&mut self, code: u16) -> Result<()>;

    /// Returns `true` if the socket reports low-level pings and supports
    /// [`terminate`](Socket::terminate).
    fn can_terminate(&self) -> bool {
        false
    }

    /// Drops the connection without a closing handshake.
    fn terminate(&mut self) {}
}
