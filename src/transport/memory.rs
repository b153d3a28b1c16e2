//! In-memory transport.
//!
//! Every [`Transport::open`] call produces a [`MemorySocket`] for the
//! listener and a matching [`RemoteEnd`] that plays the relay. Useful for
//! driving a [`Listener`](crate::Listener) deterministically.
//!
//! # Example
//!
//! ```ignore
//! let transport = MemoryTransport::new();
//! let listener = Listener::builder()
//!     .service("http://relay.test")
//!     .channel("chan")
//!     .transport(transport.clone())
//!     .build()?;
//!
//! let remote = transport.accept().await.unwrap();
//! remote.send_text("hello");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::trace;
use url::Url;

use crate::error::{Error, Result};

use super::socket::{BoxSocket, Socket, SocketEvent, Transport};

// ============================================================================
// Outbound
// ============================================================================

/// What the listener did on a memory socket, as seen by the remote end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A frame was sent.
    Frame(Bytes),
    /// A graceful close was requested with this code.
    Close(u16),
    /// The socket was terminated.
    Terminated,
}

// ============================================================================
// MemoryTransport
// ============================================================================

/// Shared state behind a [`MemoryTransport`].
struct MemoryInner {
    /// Remote ends waiting to be accepted by the test.
    accepted_tx: mpsc::UnboundedSender<RemoteEnd>,
    /// Receiving side of `accepted_tx`.
    accepted_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<RemoteEnd>>,
    /// Number of `open` calls so far.
    attempts: AtomicUsize,
    /// When set, `open` fails with a socket error.
    refuse: AtomicBool,
    /// While `true`, `open` stays pending.
    hold: watch::Sender<bool>,
    /// When set, `close` waits for the remote end to acknowledge.
    manual_close: AtomicBool,
    /// Whether sockets report pings and support termination.
    heartbeat: bool,
    /// URLs passed to `open`, in order.
    urls: Mutex<Vec<Url>>,
}

/// Transport whose sockets are driven by the caller.
#[derive(Clone)]
pub struct MemoryTransport {
    inner: Arc<MemoryInner>,
}

impl MemoryTransport {
    /// Creates a transport whose sockets cannot be terminated.
    #[must_use]
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Creates a transport whose sockets report low-level pings and can be
    /// terminated, enabling the listener's heartbeat timeout.
    #[must_use]
    pub fn with_heartbeat() -> Self {
        Self::build(true)
    }

    fn build(heartbeat: bool) -> Self {
        let (accepted_tx, accepted_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(MemoryInner {
                accepted_tx,
                accepted_rx: tokio::sync::Mutex::new(accepted_rx),
                attempts: AtomicUsize::new(0),
                refuse: AtomicBool::new(false),
                hold: watch::Sender::new(false),
                manual_close: AtomicBool::new(false),
                heartbeat,
                urls: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Waits for the next opened socket and returns its remote end.
    pub async fn accept(&self) -> Option<RemoteEnd> {
        self.inner.accepted_rx.lock().await.recv().await
    }

    /// Makes subsequent `open` calls fail (or succeed again).
    pub fn set_refuse(&self, refuse: bool) {
        self.inner.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Holds subsequent `open` calls pending until released with `false`.
    ///
    /// Attempts are counted as soon as `open` is called.
    pub fn set_pending(&self, pending: bool) {
        self.inner.hold.send_replace(pending);
    }

    /// Makes sockets opened from now on wait for [`RemoteEnd::close`]
    /// after a graceful close, instead of acknowledging at once.
    pub fn set_manual_close(&self, manual: bool) {
        self.inner.manual_close.store(manual, Ordering::SeqCst);
    }

    /// Returns how many times `open` was called.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Returns the URLs passed to `open`, in order.
    #[must_use]
    pub fn urls(&self) -> Vec<Url> {
        self.inner.urls.lock().clone()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(&self, url: &Url) -> Result<BoxSocket> {
        let attempt = self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.urls.lock().push(url.clone());

        let mut hold = self.inner.hold.subscribe();
        let held = *hold.borrow();
        if held {
            trace!(attempt, "Memory transport holding connection");
        }
        hold.wait_for(|held| !*held)
            .await
            .map_err(|_| Error::socket("Memory transport dropped"))?;

        if self.inner.refuse.load(Ordering::SeqCst) {
            trace!(attempt, "Memory transport refusing connection");
            return Err(Error::socket("Connection refused"));
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let remote = RemoteEnd {
            url: url.clone(),
            events: events_tx,
            outbound: outbound_rx,
        };
        self.inner
            .accepted_tx
            .send(remote)
            .map_err(|_| Error::socket("Memory transport dropped"))?;

        trace!(attempt, "Memory socket opened");

        Ok(Box::new(MemorySocket {
            events: events_rx,
            outbound: outbound_tx,
            heartbeat: self.inner.heartbeat,
            manual_close: self.inner.manual_close.load(Ordering::SeqCst),
            closed: false,
        }))
    }
}

// ============================================================================
// MemorySocket
// ============================================================================

/// Listener side of an in-memory connection.
pub struct MemorySocket {
    events: mpsc::UnboundedReceiver<SocketEvent>,
    outbound: mpsc::UnboundedSender<Outbound>,
    heartbeat: bool,
    manual_close: bool,
    closed: bool,
}

#[async_trait]
impl Socket for MemorySocket {
    async fn next_event(&mut self) -> Option<SocketEvent> {
        if self.closed {
            return None;
        }
        self.events.recv().await
    }

    async fn send(&mut self, frame: Bytes) -> Result<()> {
        self.outbound
            .send(Outbound::Frame(frame))
            .map_err(|_| Error::socket("Remote end dropped"))
    }

    async fn close(&mut self, code: u16) -> Result<()> {
        // Without manual close the remote end acknowledges at once.
        self.closed = !self.manual_close;
        let _ = self.outbound.send(Outbound::Close(code));
        Ok(())
    }

    fn can_terminate(&self) -> bool {
        self.heartbeat
    }

    fn terminate(&mut self) {
        self.closed = true;
        let _ = self.outbound.send(Outbound::Terminated);
    }
}

// ============================================================================
// RemoteEnd
// ============================================================================

/// Relay side of an in-memory connection.
///
/// Dropping it ends the socket as if the connection vanished.
pub struct RemoteEnd {
    url: Url,
    events: mpsc::UnboundedSender<SocketEvent>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
}

impl RemoteEnd {
    /// Returns the URL the listener opened.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Delivers a raw frame.
    pub fn send_frame(&self, frame: impl Into<Bytes>) {
        let _ = self.events.send(SocketEvent::Frame(frame.into()));
    }

    /// Delivers a text frame.
    pub fn send_text(&self, text: &str) {
        self.send_frame(Bytes::copy_from_slice(text.as_bytes()));
    }

    /// Delivers a low-level ping notification.
    pub fn ping(&self) {
        let _ = self.events.send(SocketEvent::Ping);
    }

    /// Reports a transport error.
    pub fn error(&self, message: &str) {
        let _ = self.events.send(SocketEvent::Error(message.to_string()));
    }

    /// Closes the connection from the relay side.
    pub fn close(&self, code: Option<u16>) {
        let _ = self.events.send(SocketEvent::Closed(code));
    }

    /// Waits for the next thing the listener did on this socket.
    pub async fn next_outbound(&mut self) -> Option<Outbound> {
        self.outbound.recv().await
    }

    /// Returns what the listener did, without waiting.
    pub fn try_next_outbound(&mut self) -> Option<Outbound> {
        self.outbound.try_recv().ok()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("ws://relay.test/chan?v=2").unwrap()
    }

    #[tokio::test]
    async fn test_open_pairs_socket_and_remote() {
        let transport = MemoryTransport::new();
        let mut socket = transport.open(&url()).await.unwrap();
        let mut remote = transport.accept().await.unwrap();

        assert_eq!(remote.url(), &url());
        assert_eq!(transport.attempts(), 1);

        remote.send_text("hi");
        assert_eq!(
            socket.next_event().await,
            Some(SocketEvent::Frame(Bytes::from_static(b"hi")))
        );

        socket.send(Bytes::from_static(b"yo")).await.unwrap();
        assert_eq!(
            remote.next_outbound().await,
            Some(Outbound::Frame(Bytes::from_static(b"yo")))
        );
    }

    #[tokio::test]
    async fn test_refuse() {
        let transport = MemoryTransport::new();
        transport.set_refuse(true);

        let err = transport.open(&url()).await.err().unwrap();
        assert!(err.is_recoverable());
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn test_dropped_remote_ends_socket() {
        let transport = MemoryTransport::new();
        let mut socket = transport.open(&url()).await.unwrap();
        drop(transport.accept().await.unwrap());

        assert_eq!(socket.next_event().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_open_waits_for_release() {
        let transport = MemoryTransport::new();
        transport.set_pending(true);

        let opener = {
            let transport = transport.clone();
            tokio::spawn(async move { transport.open(&url()).await.map(|_| ()) })
        };
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        assert_eq!(transport.attempts(), 1);
        assert!(!opener.is_finished());

        transport.set_pending(false);
        opener.await.unwrap().unwrap();
        assert!(transport.accept().await.is_some());
    }

    #[tokio::test]
    async fn test_manual_close_waits_for_remote() {
        let transport = MemoryTransport::new();
        transport.set_manual_close(true);
        let mut socket = transport.open(&url()).await.unwrap();
        let mut remote = transport.accept().await.unwrap();

        socket.close(1000).await.unwrap();
        assert_eq!(remote.next_outbound().await, Some(Outbound::Close(1000)));

        remote.send_text("late");
        remote.close(Some(1000));
        assert_eq!(
            socket.next_event().await,
            Some(SocketEvent::Frame(Bytes::from_static(b"late")))
        );
        assert_eq!(socket.next_event().await, Some(SocketEvent::Closed(Some(1000))));
    }

    #[tokio::test]
    async fn test_terminate_capability() {
        let transport = MemoryTransport::with_heartbeat();
        let mut socket = transport.open(&url()).await.unwrap();
        let mut remote = transport.accept().await.unwrap();

        assert!(socket.can_terminate());
        socket.terminate();
        assert_eq!(remote.next_outbound().await, Some(Outbound::Terminated));
        assert_eq!(socket.next_event().await, None);
    }
}
