//! Wire protocol spoken over the listener socket.
//!
//! Every inbound frame passes through two stages before it reaches
//! listener subscribers:
//!
//! | Stage | Module | Purpose |
//! |-------|--------|---------|
//! | 1 | `heartbeat` | Answer and strip 4-byte heartbeat pings |
//! | 2 | `encoding` | Decode the remaining payload into a [`Message`] |
//!
//! Heartbeats never reach subscribers; they are protocol-internal.

// ============================================================================
// Submodules
// ============================================================================

/// Receive encodings and decoded messages.
pub mod encoding;

/// Heartbeat ping/pong framing.
pub mod heartbeat;

// ============================================================================
// Re-exports
// ============================================================================

pub use encoding::{Encoding, Message};
pub use heartbeat::Filtered;
