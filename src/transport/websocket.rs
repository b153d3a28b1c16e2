//! WebSocket transport built on `tokio-tungstenite`.
//!
//! This is the default transport of a [`Listener`](crate::Listener).
//! Text and binary messages are both normalized to [`Bytes`]; WebSocket
//! pings are surfaced as [`SocketEvent::Ping`] (tungstenite answers them on
//! its own) so the listener can run its heartbeat timeout.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};

use super::socket::{BoxSocket, Socket, SocketEvent, Transport};

// ============================================================================
// WebSocketTransport
// ============================================================================

/// Opens client WebSocket connections (`ws://` and `wss://`).
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Creates a new WebSocket transport.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self, url: &Url) -> Result<BoxSocket> {
        debug!(%url, "Opening WebSocket");

        let (stream, response) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::socket(format!("WebSocket connect failed: {e}")))?;

        trace!(status = %response.status(), "WebSocket handshake completed");

        Ok(Box::new(WebSocketSocket::new(stream)))
    }
}

// ============================================================================
// WebSocketSocket
// ============================================================================

/// An open WebSocket connection.
///
/// Generic over the underlying stream so it also wraps server-side or
/// in-process streams.
pub struct WebSocketSocket<S = MaybeTlsStream<TcpStream>> {
    /// The stream, `None` once terminated or finished.
    stream: Option<WebSocketStream<S>>,
    /// Set after a read error; the next poll reports the socket gone.
    failed: bool,
}

impl<S> WebSocketSocket<S> {
    /// Wraps an established WebSocket stream.
    #[inline]
    #[must_use]
    pub fn new(stream: WebSocketStream<S>) -> Self {
        Self {
            stream: Some(stream),
            failed: false,
        }
    }
}

#[async_trait]
impl<S> Socket for WebSocketSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn next_event(&mut self) -> Option<SocketEvent> {
        if self.failed {
            self.stream = None;
            return None;
        }

        loop {
            let stream = self.stream.as_mut()?;

            return match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    Some(SocketEvent::Frame(Bytes::copy_from_slice(text.as_bytes())))
                }

                Some(Ok(Message::Binary(data))) => Some(SocketEvent::Frame(data)),

                Some(Ok(Message::Ping(_))) => Some(SocketEvent::Ping),

                Some(Ok(Message::Close(frame))) => {
                    // Push out the close reply tungstenite queued for us
                    let _ = stream.flush().await;
                    Some(SocketEvent::Closed(frame.map(|f| u16::from(f.code))))
                }

                // Ignore Pong and raw frames
                Some(Ok(Message::Pong(_) | Message::Frame(_))) => continue,

                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    self.stream = None;
                    None
                }

                Some(Err(e)) => {
                    self.failed = true;
                    Some(SocketEvent::Error(e.to_string()))
                }
            };
        }
    }

    async fn send(&mut self, frame: Bytes) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::socket("Socket is closed"))?;

        stream
            .send(Message::Binary(frame))
            .await
            .map_err(|e| Error::socket(format!("Send failed: {e}")))
    }

    async fn close(&mut self, code: u16) -> Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };

        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: "".into(),
        };

        match stream.close(Some(frame)).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(Error::socket(format!("Close failed: {e}"))),
        }
    }

    fn can_terminate(&self) -> bool {
        true
    }

    fn terminate(&mut self) {
        if self.stream.take().is_some() {
            debug!("WebSocket terminated");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
