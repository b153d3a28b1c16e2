//! Reconnecting channel listener.
//!
//! A [`Listener`] keeps one logical connection to a channel alive across
//! transport failures: it reconnects with backoff, answers heartbeats,
//! cycles the socket on a keepalive interval and terminates sockets whose
//! transport pings stop arriving.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `backoff` | Reconnect delay policy |
//! | `builder` | [`ListenerBuilder`] |
//! | `core` | [`Listener`] handle |
//! | `event` | [`ListenerEvent`] and [`ConnectionState`] |
//! | `event_loop` | Task owning the socket and timers |
//! | `options` | [`ListenerTimings`] |

// ============================================================================
// Submodules
// ============================================================================

/// Reconnect backoff.
pub mod backoff;

/// Listener builder.
pub mod builder;

/// Listener handle.
pub mod core;

/// Lifecycle events.
pub mod event;

/// Event loop task.
mod event_loop;

/// Timer configuration.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use backoff::Backoff;
pub use builder::ListenerBuilder;
pub use self::core::Listener;
pub use event::{ConnectionState, ListenerEvent};
pub use options::ListenerTimings;
