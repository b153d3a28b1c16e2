//! Buoy client - listen to and send messages over buoy channel relays.
//!
//! A buoy relay hosts ephemeral mailboxes ("channels") identified by an
//! opaque channel id. Messages are received over a persistent WebSocket
//! and sent with a one-shot HTTP `POST`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   POST /{channel}          ┌─────────────┐
//! │ Sender       │───────────────────────────►│             │
//! └──────────────┘   X-Buoy-(Soft-)Wait       │    Relay    │
//!                                             │             │
//! ┌──────────────┐   WS /{channel}?v=2        │             │
//! │ Listener     │◄───────────────────────────│             │
//! │  heartbeat   │   frames, 0x42 0x42 pings  └─────────────┘
//! │  decoder     │
//! └──────────────┘
//! ```
//!
//! - [`Listener`] keeps one logical connection alive: it reconnects with
//!   backoff, answers heartbeats and decodes payloads into [`Message`]s.
//! - [`receive()`] waits for exactly one message, with timeout and
//!   cancellation.
//! - [`send()`] / [`Sender`] deliver a message, optionally waiting for a
//!   listener to pick it up.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use buoy_client::{ChannelAddress, Listener, ReceiveOptions, Result, SendOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let address = ChannelAddress::random("https://cb.anchor.link")?;
//!
//!     let receiver = tokio::spawn(
//!         Listener::builder()
//!             .address(address.clone())
//!             .receive(ReceiveOptions::new().with_timeout(Duration::from_secs(30))),
//!     );
//!
//!     let options = SendOptions::new().with_timeout(Duration::from_secs(10));
//!     buoy_client::send(&address, "hello", &options).await?;
//!
//!     let message = receiver.await.expect("receiver panicked")?;
//!     println!("received: {message}");
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`channel`] | [`ChannelAddress`] and URL derivation |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`listener`] | [`Listener`], its builder, events and timings |
//! | [`protocol`] | Heartbeat framing and payload encodings |
//! | [`receive`](mod@receive) | Single-message receive |
//! | [`send`](mod@send) | Delivery requests |
//! | [`transport`] | Socket abstraction, WebSocket and in-memory transports |

// ============================================================================
// Modules
// ============================================================================

/// Channel addressing.
pub mod channel;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Reconnecting channel listener.
pub mod listener;

/// Wire protocol: heartbeat framing and payload encodings.
pub mod protocol;

/// Single-message receive.
pub mod receive;

/// Delivery requests.
pub mod send;

/// Transport layer.
///
/// The listener is written against the [`transport::Transport`] trait;
/// [`transport::WebSocketTransport`] is the default.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Channel types
pub use channel::ChannelAddress;

// Error types
pub use error::{Error, Result};

// Listener types
pub use listener::{
    Backoff, ConnectionState, Listener, ListenerBuilder, ListenerEvent, ListenerTimings,
};

// Protocol types
pub use protocol::{Encoding, Message};

// Receive
pub use receive::{ReceiveOptions, receive};

// Send
pub use send::{HttpClient, HttpResponse, ReqwestClient, SendData, SendOptions, SendResult, Sender, send};

// Transport types
pub use transport::{MemoryTransport, Socket, SocketEvent, Transport, WebSocketTransport};

// Cancellation
pub use tokio_util::sync::CancellationToken;
