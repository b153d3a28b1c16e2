//! Transport layer.
//!
//! The listener never talks to a network stack directly. It is handed a
//! [`Transport`] at construction and only ever sees [`Socket`]s and
//! normalized [`SocketEvent`]s.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Listener       │                              │  Relay          │
//! │                 │         WebSocket            │                 │
//! │  Transport      │─────────────────────────────►│  /{channel}?v=2 │
//! │  → Socket       │◄── frames / pings / close ───│                 │
//! │                 │                              │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `socket` | [`Transport`] and [`Socket`] traits |
//! | `websocket` | `tokio-tungstenite` implementation (default) |
//! | `memory` | In-memory implementation driven by the caller |

// ============================================================================
// Submodules
// ============================================================================

/// In-memory transport.
pub mod memory;

/// Transport and socket traits.
pub mod socket;

/// WebSocket transport.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::{MemorySocket, MemoryTransport, Outbound, RemoteEnd};
pub use socket::{BoxSocket, NORMAL_CLOSURE, Socket, SocketEvent, Transport};
pub use websocket::{WebSocketSocket, WebSocketTransport};
