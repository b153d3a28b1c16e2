//! Listener handle.
//!
//! A [`Listener`] is a cheap handle onto an event-loop task that owns the
//! socket, the timers and the retry counter. Commands go in through an
//! unbounded channel, events come out through a broadcast channel.
//!
//! ```text
//! ┌──────────────┐   Connect / Disconnect   ┌──────────────────┐
//! │  Listener    │─────────────────────────►│  EventLoop task  │
//! │  (handle)    │                          │  socket + timers │
//! │              │◄── ListenerEvent ────────│                  │
//! └──────────────┘     (broadcast)          └──────────────────┘
//! ```
//!
//! Dropping the last handle stops the task and closes the socket.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::Encoding;
use crate::transport::Transport;

use super::builder::ListenerBuilder;
use super::event::{ConnectionState, ListenerEvent};
use super::event_loop::EventLoop;
use super::options::ListenerTimings;

// ============================================================================
// Command
// ============================================================================

/// Commands for the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Start a connection cycle.
    Connect,
    /// Close the socket and stop reconnecting.
    Disconnect,
}

// ============================================================================
// ListenerShared
// ============================================================================

/// State shared between handles and the event loop.
#[derive(Debug, Default)]
pub(crate) struct ListenerShared {
    /// Set by `connect`, cleared by `disconnect`.
    active: AtomicBool,
    /// Written by the event loop only.
    state: RwLock<ConnectionState>,
    /// Unbounded event feeds that never lag, pruned once their receiver drops.
    taps: Mutex<Vec<mpsc::UnboundedSender<ListenerEvent>>>,
}

impl ListenerShared {
    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Sets the active flag, returning the previous value.
    #[inline]
    fn set_active(&self, active: bool) -> bool {
        self.active.swap(active, Ordering::SeqCst)
    }

    #[inline]
    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    #[inline]
    pub(crate) fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
    }

    fn add_tap(&self) -> mpsc::UnboundedReceiver<ListenerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.taps.lock().push(tx);
        rx
    }

    /// Copies an event into every live tap.
    pub(crate) fn forward(&self, event: &ListenerEvent) {
        let mut taps = self.taps.lock();
        if !taps.is_empty() {
            taps.retain(|tap| tap.send(event.clone()).is_ok());
        }
    }

    /// Drops every tap so their receivers observe the end of the stream.
    pub(crate) fn close_taps(&self) {
        self.taps.lock().clear();
    }
}

// ============================================================================
// Listener
// ============================================================================

/// Long-lived, self-healing connection to one channel.
///
/// # Example
///
/// ```no_run
/// use buoy_client::{Listener, ListenerEvent};
///
/// # async fn example() -> buoy_client::Result<()> {
/// let listener = Listener::builder()
///     .service("https://cb.anchor.link")
///     .channel("my-channel-id")
///     .build()?;
///
/// let mut events = listener.subscribe();
/// while let Ok(event) = events.recv().await {
///     if let ListenerEvent::Message(message) = event {
///         println!("{message}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Listener {
    /// WebSocket URL of the channel.
    url: Url,
    /// Receive encoding.
    encoding: Encoding,
    /// Shared with the event loop.
    shared: Arc<ListenerShared>,
    /// Command channel into the event loop.
    commands: mpsc::UnboundedSender<Command>,
    /// Event channel out of the event loop.
    events: broadcast::Sender<ListenerEvent>,
}

// ============================================================================
// Listener - Display
// ============================================================================

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("url", &self.url.as_str())
            .field("encoding", &self.encoding)
            .field("active", &self.shared.is_active())
            .field("state", &self.shared.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Listener - Constructor
// ============================================================================

impl Listener {
    /// Creates a new listener builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ListenerBuilder {
        ListenerBuilder::new()
    }

    /// Spawns the event loop and returns the first handle.
    pub(crate) fn spawn(
        url: Url,
        encoding: Encoding,
        transport: Arc<dyn Transport>,
        timings: ListenerTimings,
        event_capacity: usize,
        auto_connect: bool,
    ) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|_| Error::config("Listener must be created inside a tokio runtime"))?;

        let (commands, command_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(event_capacity);
        let shared = Arc::new(ListenerShared::default());

        let event_loop = EventLoop::new(
            url.clone(),
            encoding,
            transport,
            timings,
            command_rx,
            events.clone(),
            Arc::clone(&shared),
        );
        runtime.spawn(event_loop.run());

        debug!(%url, %encoding, "Listener created");

        let listener = Self {
            url,
            encoding,
            shared,
            commands,
            events,
        };

        if auto_connect {
            listener.connect();
        }

        Ok(listener)
    }
}

// ============================================================================
// Listener - Public API
// ============================================================================

impl Listener {
    /// Starts connecting. No-op if already active.
    pub fn connect(&self) {
        if self.shared.set_active(true) {
            trace!(url = %self.url, "Listener already active");
            return;
        }

        debug!(url = %self.url, "Listener activated");
        let _ = self.commands.send(Command::Connect);
    }

    /// Stops the listener and closes the socket with a normal closure.
    ///
    /// No-op if already inactive.
    pub fn disconnect(&self) {
        if !self.shared.set_active(false) {
            trace!(url = %self.url, "Listener already inactive");
            return;
        }

        debug!(url = %self.url, "Listener deactivated");
        let _ = self.commands.send(Command::Disconnect);
    }

    /// Returns `true` if active and the socket is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.is_active() && self.shared.state() == ConnectionState::Connected
    }

    /// Returns `true` if `connect` was called and `disconnect` was not.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.is_active()
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Returns the WebSocket URL this listener connects to.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the receive encoding.
    #[inline]
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Subscribes to lifecycle events.
    ///
    /// Only events published after this call are received. Subscribe
    /// before connecting to observe the first message.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ListenerEvent> {
        self.events.subscribe()
    }

    /// Subscribes to every event published after this call, without lag.
    ///
    /// Unlike [`subscribe`](Self::subscribe) the feed is unbounded, so a
    /// slow reader never misses the first message.
    pub(crate) fn tap(&self) -> mpsc::UnboundedReceiver<ListenerEvent> {
        self.shared.add_tap()
    }

    /// Resolves once the event loop has stopped.
    pub async fn closed(&self) {
        self.commands.closed().await;
    }
}

// ============================================================================
// Tests
// ============================================================================
