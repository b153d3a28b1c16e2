//! Listener event loop.
//!
//! One task per [`Listener`](super::Listener). It exclusively owns the
//! current socket, so notifications from a replaced socket can never be
//! observed.
//!
//! # Phases
//!
//! ```text
//!            Connect                 open ok
//!  ┌──────┐ ────────► ┌────────────┐ ───────► ┌────────────┐
//!  │ Idle │           │ Connecting │          │ Connected  │
//!  └──────┘ ◄──────── └────────────┘ ◄─────── └────────────┘
//!           inactive     ▲     │ open err        │ close / keepalive /
//!                        │     ▼                 │ heartbeat timeout
//!                        │  ┌─────────┐          │
//!                        └──│ Backoff │◄─────────┘ (if still active)
//!                           └─────────┘
//! ```
//!
//! Commands only wake the loop; what happens next is decided by the shared
//! `active` flag, which `connect`/`disconnect` flip synchronously.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::Error;
use crate::protocol::Encoding;
use crate::protocol::heartbeat::{self, Filtered};
use crate::transport::{BoxSocket, NORMAL_CLOSURE, SocketEvent, Transport};

use super::backoff::Backoff;
use super::core::{Command, ListenerShared};
use super::event::{ConnectionState, ListenerEvent};
use super::options::ListenerTimings;

// ============================================================================
// Constants
// ============================================================================

/// Deadline used for disarmed timers.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365);

// ============================================================================
// Next
// ============================================================================

/// Phase the loop moves to after the current one finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    /// Wait for a `connect` call.
    Idle,
    /// Open a socket now.
    Connect,
    /// Wait for the backoff delay, then connect.
    Backoff,
    /// All handles dropped; exit the task.
    Shutdown,
}

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closed {
    /// Remote close, transport failure or heartbeat timeout.
    Remote,
    /// Disconnect or keepalive close initiated here.
    Local,
    /// All handles dropped.
    Shutdown,
}

// ============================================================================
// EventLoop
// ============================================================================

/// State owned by the listener task.
pub(crate) struct EventLoop {
    url: Url,
    encoding: Encoding,
    transport: Arc<dyn Transport>,
    timings: ListenerTimings,
    backoff: Backoff,
    commands: mpsc::UnboundedReceiver<Command>,
    events: broadcast::Sender<ListenerEvent>,
    shared: Arc<ListenerShared>,
}

impl EventLoop {
    pub(crate) fn new(
        url: Url,
        encoding: Encoding,
        transport: Arc<dyn Transport>,
        timings: ListenerTimings,
        commands: mpsc::UnboundedReceiver<Command>,
        events: broadcast::Sender<ListenerEvent>,
        shared: Arc<ListenerShared>,
    ) -> Self {
        Self {
            url,
            encoding,
            transport,
            backoff: timings.backoff,
            timings,
            commands,
            events,
            shared,
        }
    }

    /// Drives the listener until every handle is dropped.
    pub(crate) async fn run(mut self) {
        let mut next = Next::Idle;

        loop {
            next = match next {
                Next::Idle => self.idle().await,
                Next::Connect => self.connect().await,
                Next::Backoff => self.wait_backoff().await,
                Next::Shutdown => break,
            };
        }

        self.shared.set_state(ConnectionState::Inactive);
        self.shared.close_taps();
        debug!(url = %self.url, "Listener event loop terminated");
    }
}

// ============================================================================
// EventLoop - Phases
// ============================================================================

impl EventLoop {
    /// Waits until the listener is activated.
    async fn idle(&mut self) -> Next {
        self.shared.set_state(ConnectionState::Inactive);

        loop {
            match self.commands.recv().await {
                Some(_) if self.shared.is_active() => return Next::Connect,
                Some(command) => trace!(?command, "Ignoring command while idle"),
                None => return Next::Shutdown,
            }
        }
    }

    /// Opens a socket and runs it until it closes.
    async fn connect(&mut self) -> Next {
        self.shared.set_state(ConnectionState::Connecting);
        debug!(url = %self.url, attempt = self.backoff.attempt(), "Opening socket");

        let transport = Arc::clone(&self.transport);
        let url = self.url.clone();
        let open = async move { transport.open(&url).await };
        tokio::pin!(open);

        let result = loop {
            tokio::select! {
                result = &mut open => break result,

                command = self.commands.recv() => match command {
                    None => return Next::Shutdown,
                    Some(_) if !self.shared.is_active() => {
                        debug!(url = %self.url, "Connection attempt aborted");
                        self.emit(ListenerEvent::Disconnected);
                        return Next::Idle;
                    }
                    Some(_) => {}
                },
            }
        };

        match result {
            Ok(socket) => {
                self.backoff.reset();
                self.shared.set_state(ConnectionState::Connected);
                info!(url = %self.url, "Listener connected");
                self.emit(ListenerEvent::Connected);

                match self.run_connection(socket).await {
                    Closed::Shutdown => Next::Shutdown,
                    Closed::Remote | Closed::Local => {
                        self.emit(ListenerEvent::Disconnected);
                        self.after_close()
                    }
                }
            }
            Err(e) => {
                debug!(url = %self.url, error = %e, "Failed to open socket");
                if self.shared.is_active() {
                    self.emit(ListenerEvent::Error(e));
                }
                self.emit(ListenerEvent::Disconnected);
                self.after_close()
            }
        }
    }

    /// Chooses between reconnecting and going idle after a closure.
    fn after_close(&self) -> Next {
        if self.shared.is_active() {
            self.shared.set_state(ConnectionState::Connecting);
            Next::Backoff
        } else {
            self.shared.set_state(ConnectionState::Inactive);
            Next::Idle
        }
    }

    /// Sleeps for the next backoff delay unless deactivated first.
    async fn wait_backoff(&mut self) -> Next {
        let delay = self.backoff.next_delay();
        debug!(
            url = %self.url,
            delay_ms = delay.as_millis() as u64,
            attempt = self.backoff.attempt(),
            "Reconnect scheduled"
        );

        let timer = sleep(delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    None => return Next::Shutdown,
                    Some(_) if !self.shared.is_active() => {
                        debug!(url = %self.url, "Reconnect cancelled");
                        return Next::Idle;
                    }
                    Some(_) => {}
                },

                () = &mut timer => return Next::Connect,
            }
        }
    }
}

// ============================================================================
// EventLoop - Connection
// ============================================================================

impl EventLoop {
    /// Pumps one open socket until it closes.
    async fn run_connection(&mut self, mut socket: BoxSocket) -> Closed {
        let keepalive = sleep(self.timings.keepalive().unwrap_or(FAR_FUTURE));
        tokio::pin!(keepalive);

        let heartbeat_timer = sleep(FAR_FUTURE);
        tokio::pin!(heartbeat_timer);
        let mut heartbeat_armed = false;

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    None => {
                        self.close_gracefully(&mut socket).await;
                        return Closed::Shutdown;
                    }
                    Some(_) if !self.shared.is_active() => {
                        debug!(url = %self.url, "Disconnecting");
                        self.close_gracefully(&mut socket).await;
                        return Closed::Local;
                    }
                    Some(_) => {}
                },

                () = &mut keepalive, if self.timings.keepalive().is_some() => {
                    debug!(url = %self.url, "Keepalive interval elapsed, cycling connection");
                    self.close_gracefully(&mut socket).await;
                    return Closed::Local;
                }

                () = &mut heartbeat_timer, if heartbeat_armed => {
                    warn!(url = %self.url, "Heartbeat timed out, terminating socket");
                    socket.terminate();
                    return Closed::Remote;
                }

                event = socket.next_event() => match event {
                    Some(SocketEvent::Frame(frame)) => {
                        self.handle_frame(&mut socket, frame).await;
                    }
                    Some(SocketEvent::Ping) => {
                        if let Some(window) = self.timings.heartbeat()
                            && socket.can_terminate()
                        {
                            trace!("Transport ping");
                            heartbeat_timer.as_mut().reset(Instant::now() + window);
                            heartbeat_armed = true;
                        }
                    }
                    Some(SocketEvent::Error(message)) => {
                        debug!(url = %self.url, error = %message, "Socket error");
                        if self.shared.is_active() {
                            self.emit(ListenerEvent::Error(Error::socket(message)));
                        }
                    }
                    Some(SocketEvent::Closed(code)) => {
                        debug!(url = %self.url, ?code, "Socket closed");
                        return Closed::Remote;
                    }
                    None => {
                        debug!(url = %self.url, "Socket ended");
                        return Closed::Remote;
                    }
                },
            }
        }
    }

    /// Runs one inbound frame through the heartbeat filter and decoder.
    async fn handle_frame(&self, socket: &mut BoxSocket, frame: Bytes) {
        let payload = match heartbeat::filter(frame) {
            Filtered::Heartbeat { reply, rest } => {
                trace!(seq = ?reply.last(), "Heartbeat ping");
                if let Err(e) = socket.send(reply).await {
                    warn!(error = %e, "Failed to send heartbeat pong");
                }
                if rest.is_empty() {
                    return;
                }
                rest
            }
            Filtered::Payload(payload) => payload,
        };

        self.deliver(payload);
    }

    /// Decodes a payload and publishes the result.
    fn deliver(&self, payload: Bytes) {
        trace!(len = payload.len(), "Inbound frame");

        match self.encoding.decode(payload) {
            Ok(message) => self.emit(ListenerEvent::Message(message)),
            Err(e) => {
                warn!(encoding = %self.encoding, error = %e, "Dropping undecodable frame");
                self.emit(ListenerEvent::Error(e));
            }
        }
    }

    /// Closes with a normal closure and waits for the handshake.
    ///
    /// Payloads that arrive before the acknowledgement are still delivered
    /// while the listener is active, as happens on a keepalive cycle.
    /// Heartbeats are not answered once the close has been sent.
    /// Terminates the socket if the handshake outlasts the close timeout.
    async fn close_gracefully(&self, socket: &mut BoxSocket) {
        self.shared.set_state(ConnectionState::Closing);

        if let Err(e) = socket.close(NORMAL_CLOSURE).await {
            warn!(url = %self.url, error = %e, "Failed to start closing handshake");
            socket.terminate();
            return;
        }

        let drain = async {
            loop {
                match socket.next_event().await {
                    Some(SocketEvent::Closed(_)) | None => break,
                    Some(SocketEvent::Frame(frame)) if self.shared.is_active() => {
                        match heartbeat::filter(frame) {
                            Filtered::Heartbeat { rest, .. } if rest.is_empty() => {}
                            Filtered::Heartbeat { rest, .. } => self.deliver(rest),
                            Filtered::Payload(payload) => self.deliver(payload),
                        }
                    }
                    Some(SocketEvent::Frame(frame)) => {
                        debug!(len = frame.len(), "Dropping frame received while disconnecting");
                    }
                    Some(event) => trace!(?event, "Ignoring event while closing"),
                }
            }
        };

        if timeout(self.timings.close_timeout, drain).await.is_err() {
            warn!(url = %self.url, "Closing handshake timed out, terminating socket");
            socket.terminate();
        }
    }

    /// Publishes an event. Having no subscribers is not an error.
    fn emit(&self, event: ListenerEvent) {
        self.shared.forward(&event);
        let _ = self.events.send(event);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::sync::broadcast::error::TryRecvError;

    use crate::listener::Listener;
    use crate::protocol::Message;
    use crate::transport::{MemoryTransport, Outbound, RemoteEnd};

    const SERVICE: &str = "http://relay.test";

    fn listener(transport: &MemoryTransport) -> Listener {
        Listener::builder()
            .service(SERVICE)
            .channel("chan")
            .transport(transport.clone())
            .auto_connect(false)
            .build()
            .unwrap()
    }

    async fn next_event(events: &mut broadcast::Receiver<ListenerEvent>) -> ListenerEvent {
        events.recv().await.unwrap()
    }

    async fn connected(
        transport: &MemoryTransport,
        listener: &Listener,
        events: &mut broadcast::Receiver<ListenerEvent>,
    ) -> RemoteEnd {
        listener.connect();
        let remote = transport.accept().await.unwrap();
        assert!(matches!(next_event(events).await, ListenerEvent::Connected));
        remote
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_opens_listen_url() {
        let transport = MemoryTransport::new();
        let listener = listener(&transport);
        let mut events = listener.subscribe();

        let remote = connected(&transport, &listener, &mut events).await;

        assert_eq!(remote.url().as_str(), "ws://relay.test/chan?v=2");
        assert!(listener.is_connected());
        assert_eq!(listener.state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_twice_opens_once() {
        let transport = MemoryTransport::new();
        let listener = listener(&transport);
        let mut events = listener.subscribe();

        listener.connect();
        listener.connect();
        let _remote = transport.accept().await.unwrap();
        assert!(matches!(next_event(&mut events).await, ListenerEvent::Connected));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_when_inactive_is_noop() {
        let transport = MemoryTransport::new();
        let listener = listener(&transport);
        let mut events = listener.subscribe();

        listener.disconnect();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(transport.attempts(), 0);
        assert_eq!(listener.state(), ConnectionState::Inactive);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_closes_normally() {
        let transport = MemoryTransport::new();
        let listener = listener(&transport);
        let mut events = listener.subscribe();
        let mut remote = connected(&transport, &listener, &mut events).await;

        listener.disconnect();

        assert_eq!(remote.next_outbound().await, Some(Outbound::Close(1000)));
        assert!(matches!(next_event(&mut events).await, ListenerEvent::Disconnected));
        assert!(!listener.is_connected());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_during_open() {
        let transport = MemoryTransport::new();
        transport.set_pending(true);
        let listener = listener(&transport);
        let mut events = listener.subscribe();

        listener.connect();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(transport.attempts(), 1);
        assert_eq!(listener.state(), ConnectionState::Connecting);

        listener.disconnect();
        assert!(matches!(next_event(&mut events).await, ListenerEvent::Disconnected));

        transport.set_pending(false);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(listener.state(), ConnectionState::Inactive);
        assert_eq!(transport.attempts(), 1);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

        listener.connect();
        let _remote = transport.accept().await.unwrap();
        assert!(matches!(next_event(&mut events).await, ListenerEvent::Connected));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_payload_during_keepalive_close_is_delivered() {
        let transport = MemoryTransport::new();
        transport.set_manual_close(true);
        let listener = listener(&transport);
        let mut events = listener.subscribe();
        let mut remote = connected(&transport, &listener, &mut events).await;

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(remote.next_outbound().await, Some(Outbound::Close(1000)));
        assert_eq!(listener.state(), ConnectionState::Closing);

        remote.send_frame(heartbeat::ping(3));
        remote.send_text("late");
        remote.close(Some(1000));

        match next_event(&mut events).await {
            ListenerEvent::Message(message) => assert_eq!(message.as_text(), Some("late")),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(next_event(&mut events).await, ListenerEvent::Disconnected));
        assert!(remote.try_next_outbound().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_payload_during_disconnect_is_dropped() {
        let transport = MemoryTransport::new();
        transport.set_manual_close(true);
        let listener = listener(&transport);
        let mut events = listener.subscribe();
        let mut remote = connected(&transport, &listener, &mut events).await;

        listener.disconnect();
        assert_eq!(remote.next_outbound().await, Some(Outbound::Close(1000)));

        remote.send_text("ignored");
        remote.close(Some(1000));

        assert!(matches!(next_event(&mut events).await, ListenerEvent::Disconnected));
        assert_eq!(listener.state(), ConnectionState::Inactive);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unacknowledged_close_terminates() {
        let transport = MemoryTransport::new();
        transport.set_manual_close(true);
        let listener = listener(&transport);
        let mut events = listener.subscribe();
        let mut remote = connected(&transport, &listener, &mut events).await;

        listener.disconnect();
        assert_eq!(remote.next_outbound().await, Some(Outbound::Close(1000)));

        let start = Instant::now();
        assert_eq!(remote.next_outbound().await, Some(Outbound::Terminated));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(6));
        assert!(matches!(next_event(&mut events).await, ListenerEvent::Disconnected));
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_frames_in_order() {
        let transport = MemoryTransport::new();
        let listener = listener(&transport);
        let mut events = listener.subscribe();
        let remote = connected(&transport, &listener, &mut events).await;

        remote.send_text("one");
        remote.send_text("two");

        for expected in ["one", "two"] {
            match next_event(&mut events).await {
                ListenerEvent::Message(Message::Text(text)) => assert_eq!(text, expected),
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_answered_not_emitted() {
        let transport = MemoryTransport::new();
        let listener = listener(&transport);
        let mut events = listener.subscribe();
        let mut remote = connected(&transport, &listener, &mut events).await;

        remote.send_frame(heartbeat::ping(7));
        assert_eq!(
            remote.next_outbound().await,
            Some(Outbound::Frame(heartbeat::pong(7)))
        );

        remote.send_text("after");
        match next_event(&mut events).await {
            ListenerEvent::Message(message) => assert_eq!(message.as_text(), Some("after")),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_with_trailing_payload() {
        let transport = MemoryTransport::new();
        let listener = listener(&transport);
        let mut events = listener.subscribe();
        let mut remote = connected(&transport, &listener, &mut events).await;

        remote.send_frame(&b"\x42\x42\x01\x09tail"[..]);

        assert_eq!(
            remote.next_outbound().await,
            Some(Outbound::Frame(heartbeat::pong(9)))
        );
        match next_event(&mut events).await {
            ListenerEvent::Message(message) => assert_eq!(message.as_text(), Some("tail")),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_json_emits_message_error() {
        let transport = MemoryTransport::new();
        let listener = Listener::builder()
            .service(SERVICE)
            .channel("chan")
            .encoding(Encoding::Json)
            .transport(transport.clone())
            .auto_connect(false)
            .build()
            .unwrap();
        let mut events = listener.subscribe();
        let remote = connected(&transport, &listener, &mut events).await;

        remote.send_text("{not json");

        match next_event(&mut events).await {
            ListenerEvent::Error(e) => assert!(e.is_message_error()),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(listener.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_socket_error_does_not_close() {
        let transport = MemoryTransport::new();
        let listener = listener(&transport);
        let mut events = listener.subscribe();
        let remote = connected(&transport, &listener, &mut events).await;

        remote.error("boom");
        match next_event(&mut events).await {
            ListenerEvent::Error(e) => assert!(e.is_recoverable()),
            other => panic!("unexpected event: {other:?}"),
        }

        remote.send_text("still here");
        assert!(matches!(
            next_event(&mut events).await,
            ListenerEvent::Message(_)
        ));
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_close_reconnects_immediately() {
        let transport = MemoryTransport::new();
        let listener = listener(&transport);
        let mut events = listener.subscribe();
        let remote = connected(&transport, &listener, &mut events).await;

        remote.close(Some(1001));
        assert!(matches!(next_event(&mut events).await, ListenerEvent::Disconnected));

        let start = Instant::now();
        let _remote = transport.accept().await.unwrap();
        assert!(matches!(next_event(&mut events).await, ListenerEvent::Connected));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_opens_back_off() {
        let transport = MemoryTransport::new();
        transport.set_refuse(true);
        let listener = listener(&transport);
        let mut events = listener.subscribe();

        listener.connect();
        for _ in 0..3 {
            match next_event(&mut events).await {
                ListenerEvent::Error(e) => assert!(e.is_recoverable()),
                other => panic!("unexpected event: {other:?}"),
            }
            assert!(matches!(next_event(&mut events).await, ListenerEvent::Disconnected));
        }

        // Attempts at 0ms, then after 0ms and 49ms; the next waits 196ms.
        assert_eq!(transport.attempts(), 3);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(transport.attempts(), 3);

        transport.set_refuse(false);
        let _remote = transport.accept().await.unwrap();
        assert!(matches!(next_event(&mut events).await, ListenerEvent::Connected));
        assert_eq!(transport.attempts(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_during_backoff_stops_retrying() {
        let transport = MemoryTransport::new();
        transport.set_refuse(true);
        let listener = listener(&transport);
        let mut events = listener.subscribe();

        listener.connect();
        for _ in 0..4 {
            let _ = next_event(&mut events).await;
        }
        listener.disconnect();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(transport.attempts(), 2);
        assert_eq!(listener.state(), ConnectionState::Inactive);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_cycles_connection() {
        let transport = MemoryTransport::new();
        let listener = listener(&transport);
        let mut events = listener.subscribe();
        let mut remote = connected(&transport, &listener, &mut events).await;

        tokio::time::sleep(Duration::from_secs(599)).await;
        assert!(remote.try_next_outbound().is_none());

        assert_eq!(remote.next_outbound().await, Some(Outbound::Close(1000)));
        assert!(matches!(next_event(&mut events).await, ListenerEvent::Disconnected));

        let _remote = transport.accept().await.unwrap();
        assert!(matches!(next_event(&mut events).await, ListenerEvent::Connected));
        assert!(listener.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_timeout_terminates() {
        let transport = MemoryTransport::with_heartbeat();
        let listener = listener(&transport);
        let mut events = listener.subscribe();
        let mut remote = connected(&transport, &listener, &mut events).await;

        remote.ping();
        tokio::time::sleep(Duration::from_secs(10)).await;
        remote.ping();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(remote.try_next_outbound().is_none());

        assert_eq!(remote.next_outbound().await, Some(Outbound::Terminated));
        assert!(matches!(next_event(&mut events).await, ListenerEvent::Disconnected));

        let _remote = transport.accept().await.unwrap();
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_needs_terminate_capability() {
        let transport = MemoryTransport::new();
        let listener = listener(&transport);
        let mut events = listener.subscribe();
        let mut remote = connected(&transport, &listener, &mut events).await;

        remote.ping();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(remote.try_next_outbound().is_none());
        assert!(listener.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_heartbeat_timer_before_first_ping() {
        let transport = MemoryTransport::with_heartbeat();
        let listener = listener(&transport);
        let mut events = listener.subscribe();
        let mut remote = connected(&transport, &listener, &mut events).await;

        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(remote.try_next_outbound().is_none());
        assert!(listener.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_shuts_down() {
        let transport = MemoryTransport::new();
        let listener = listener(&transport);
        let mut events = listener.subscribe();
        let mut remote = connected(&transport, &listener, &mut events).await;

        drop(listener);

        assert_eq!(remote.next_outbound().await, Some(Outbound::Close(1000)));
        assert!(matches!(events.recv().await, Err(broadcast::error::RecvError::Closed)));
    }
}
