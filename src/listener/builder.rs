//! Builder pattern for listener configuration.
//!
//! # Example
//!
//! ```no_run
//! use buoy_client::{Encoding, Listener};
//!
//! # async fn example() -> buoy_client::Result<()> {
//! let listener = Listener::builder()
//!     .service("https://cb.anchor.link")
//!     .channel("my-channel-id")
//!     .encoding(Encoding::Json)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::channel::ChannelAddress;
use crate::error::{Error, Result};
use crate::protocol::{Encoding, Message};
use crate::receive::{self, ReceiveOptions};
use crate::transport::{Transport, WebSocketTransport};

use super::core::Listener;
use super::options::{DEFAULT_EVENT_CAPACITY, ListenerTimings};

// ============================================================================
// ListenerBuilder
// ============================================================================

/// Builder for configuring a [`Listener`].
///
/// Use [`Listener::builder()`] to create a new builder.
#[derive(Clone)]
pub struct ListenerBuilder {
    /// Relay service base URL.
    service: Option<String>,
    /// Channel id.
    channel: Option<String>,
    /// Full address; takes precedence over `service`/`channel`.
    address: Option<ChannelAddress>,
    /// Receive encoding.
    encoding: Encoding,
    /// Connect as soon as the listener is built.
    auto_connect: bool,
    /// Socket factory; WebSocket when unset.
    transport: Option<Arc<dyn Transport>>,
    /// Timer configuration.
    timings: ListenerTimings,
    /// Capacity of the event channel.
    event_capacity: usize,
}

impl Default for ListenerBuilder {
    fn default() -> Self {
        Self {
            service: None,
            channel: None,
            address: None,
            encoding: Encoding::default(),
            auto_connect: true,
            transport: None,
            timings: ListenerTimings::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl fmt::Debug for ListenerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerBuilder")
            .field("service", &self.service)
            .field("channel", &self.channel)
            .field("address", &self.address)
            .field("encoding", &self.encoding)
            .field("auto_connect", &self.auto_connect)
            .field("custom_transport", &self.transport.is_some())
            .field("timings", &self.timings)
            .field("event_capacity", &self.event_capacity)
            .finish()
    }
}

// ============================================================================
// ListenerBuilder Implementation
// ============================================================================

impl ListenerBuilder {
    /// Creates a new builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relay service base URL (`http(s)://` or `ws(s)://`).
    #[inline]
    #[must_use]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Sets the channel id.
    #[inline]
    #[must_use]
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Sets service and channel from an existing address.
    #[inline]
    #[must_use]
    pub fn address(mut self, address: ChannelAddress) -> Self {
        self.address = Some(address);
        self
    }

    /// Sets how inbound payloads are decoded. Defaults to text.
    #[inline]
    #[must_use]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets whether `build` starts connecting right away. Defaults to `true`.
    #[inline]
    #[must_use]
    pub fn auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = auto_connect;
        self
    }

    /// Replaces the default WebSocket transport.
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: impl Transport) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets the timer configuration.
    #[inline]
    #[must_use]
    pub fn timings(mut self, timings: ListenerTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Sets the event channel capacity. Slower subscribers lag.
    #[inline]
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Builds the listener and spawns its event loop.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if service or channel is missing, the timings or
    ///   event capacity are invalid, or there is no tokio runtime
    /// - [`Error::InvalidUrl`] if the listen URL does not parse
    pub fn build(self) -> Result<Listener> {
        let address = self.validate_address()?;
        let url = address.listen_url()?;
        self.timings.validate()?;

        if self.event_capacity == 0 {
            return Err(Error::config("Event capacity must be greater than zero"));
        }

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(WebSocketTransport::new()));

        Listener::spawn(
            url,
            self.encoding,
            transport,
            self.timings,
            self.event_capacity,
            self.auto_connect,
        )
    }

    /// Builds a listener, waits for one message, then disconnects.
    ///
    /// See [`receive`](crate::receive()).
    ///
    /// # Errors
    ///
    /// See [`receive`](crate::receive()).
    pub async fn receive(self, options: ReceiveOptions) -> Result<Message> {
        receive::receive(self, options).await
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ListenerBuilder {
    /// Resolves the channel address from `address` or `service` + `channel`.
    fn validate_address(&self) -> Result<ChannelAddress> {
        if let Some(address) = &self.address {
            return Ok(address.clone());
        }

        let service = self.service.clone().ok_or_else(|| {
            Error::config(
                "Service url is required. Use .service() to set it.\n\
                 Example: Listener::builder().service(\"https://cb.anchor.link\")",
            )
        })?;
        let channel = self.channel.clone().ok_or_else(|| {
            Error::config(
                "Channel is required. Use .channel() to set it.\n\
                 Example: Listener::builder().channel(\"my-channel-id\")",
            )
        })?;

        ChannelAddress::new(service, channel)
    }
}

// ============================================================================
// Tests
// ============================================================================
