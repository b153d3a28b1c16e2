//! Single-message receive.
//!
//! [`receive`] builds a private [`Listener`], waits for the first message
//! and tears the listener down again. Socket errors along the way are
//! survived (the listener reconnects) and remembered, so a timeout or
//! cancellation can report what was going wrong at the time.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use buoy_client::{Listener, ReceiveOptions};
//!
//! # async fn example() -> buoy_client::Result<()> {
//! let message = Listener::builder()
//!     .service("https://cb.anchor.link")
//!     .channel("my-channel-id")
//!     .receive(ReceiveOptions::new().with_timeout(Duration::from_secs(30)))
//!     .await?;
//! println!("{message}");
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};
use crate::listener::{Listener, ListenerBuilder, ListenerEvent};
use crate::protocol::Message;

// ============================================================================
// ReceiveOptions
// ============================================================================

/// Options for a single [`receive`] call.
#[derive(Debug, Clone, Default)]
pub struct ReceiveOptions {
    /// Give up after this long. `None` or zero waits indefinitely.
    pub timeout: Option<Duration>,

    /// Cancels the call when triggered.
    pub cancel: Option<CancellationToken>,
}

impl ReceiveOptions {
    /// Creates options with no timeout and no cancellation.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the cancellation token.
    #[inline]
    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Returns the effective timeout, treating zero as unset.
    #[inline]
    #[must_use]
    pub fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|timeout| !timeout.is_zero())
    }
}

// ============================================================================
// receive
// ============================================================================

/// Receives a single message from a channel.
///
/// The builder's `auto_connect` setting is ignored: the listener is
/// subscribed to before it connects so no message can slip past. The
/// subscription is unbounded, so the call settles with the first decoded
/// message however small the builder's event capacity is. Use a
/// [`Listener`] directly to receive more than one message.
///
/// # Errors
///
/// - [`Error::Config`] / [`Error::InvalidUrl`] if the builder is invalid
/// - [`Error::TimedOut`] if the timeout elapses first
/// - [`Error::Cancelled`] if the token is cancelled first
/// - [`Error::Message`] if a frame cannot be decoded
/// - [`Error::ListenerClosed`] if the listener task stops
pub async fn receive(builder: ListenerBuilder, options: ReceiveOptions) -> Result<Message> {
    let listener = builder.auto_connect(false).build()?;
    let mut events = listener.tap();
    listener.connect();

    let result = wait_for_message(&listener, &mut events, &options).await;

    match &result {
        Ok(_) => debug!(url = %listener.url(), "Receive settled with a message"),
        Err(e) => debug!(url = %listener.url(), error = %e, "Receive settled with an error"),
    }

    listener.disconnect();
    result
}

/// Races the listener's events against the timeout and cancellation.
async fn wait_for_message(
    listener: &Listener,
    events: &mut mpsc::UnboundedReceiver<ListenerEvent>,
    options: &ReceiveOptions,
) -> Result<Message> {
    let deadline = options.effective_timeout();
    let timer = sleep(deadline.unwrap_or(Duration::MAX));
    tokio::pin!(timer);

    let cancel = options.cancel.clone().unwrap_or_default();
    let mut last_error: Option<Error> = None;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => return Err(Error::cancelled(last_error)),

            () = &mut timer, if deadline.is_some() => return Err(Error::timed_out(last_error)),

            () = listener.closed() => return Err(Error::ListenerClosed),

            event = events.recv() => match event {
                Some(ListenerEvent::Message(message)) => return Ok(message),
                Some(ListenerEvent::Error(e)) if e.is_recoverable() => {
                    debug!(error = %e, "Recoverable error while receiving");
                    last_error = Some(e);
                }
                Some(ListenerEvent::Error(e)) => return Err(e),
                Some(ListenerEvent::Connected | ListenerEvent::Disconnected) => {}
                None => return Err(Error::ListenerClosed),
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
