//! Delivery requests.
//!
//! A message is sent to a channel with one HTTP `POST` to its delivery URL.
//! The relay can hold the request open until a listener picks the message
//! up, controlled by two wait hints:
//!
//! | Header | When | Relay behaviour |
//! |--------|------|-----------------|
//! | `X-Buoy-Wait` | `require_delivery` | Hold until delivered, else 408 |
//! | `X-Buoy-Soft-Wait` | timeout only | Hold until delivered, else buffer |
//!
//! Both carry the timeout in whole seconds, rounded up. The response
//! header `X-Buoy-Delivery` tells whether the message reached a listener.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use buoy_client::{ChannelAddress, SendOptions, SendResult};
//!
//! # async fn example() -> buoy_client::Result<()> {
//! let address = ChannelAddress::new("https://cb.anchor.link", "my-channel-id")?;
//! let options = SendOptions::new()
//!     .with_timeout(Duration::from_secs(10))
//!     .with_require_delivery(true);
//!
//! let result = buoy_client::send(&address, "hello", &options).await?;
//! assert_eq!(result, SendResult::Delivered);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// HTTP client trait and reqwest implementation.
pub mod http_client;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::channel::ChannelAddress;
use crate::error::{Error, Result};

pub use http_client::{HttpClient, HttpResponse, ReqwestClient};

// ============================================================================
// Constants
// ============================================================================

/// Hard wait hint: fail unless delivered in time.
pub const WAIT_HEADER: &str = "X-Buoy-Wait";

/// Soft wait hint: buffer if not delivered in time.
pub const SOFT_WAIT_HEADER: &str = "X-Buoy-Soft-Wait";

/// Response header reporting the delivery outcome.
pub const DELIVERY_HEADER: &str = "X-Buoy-Delivery";

/// Relay gave up waiting for a listener.
const STATUS_TIMEOUT: u16 = 408;

/// Relay dropped the request, usually because a newer one replaced it.
const STATUS_GONE: u16 = 410;

// ============================================================================
// SendData
// ============================================================================

/// A message body.
#[derive(Debug, Clone, PartialEq)]
pub enum SendData {
    /// UTF-8 text, sent as is.
    Text(String),
    /// Raw bytes, sent as is.
    Binary(Bytes),
    /// JSON value, serialized before sending.
    Json(Value),
}

impl SendData {
    /// Serializes the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Message`] if a JSON value cannot be serialized.
    pub fn into_body(self) -> Result<Bytes> {
        match self {
            Self::Text(text) => Ok(Bytes::from(text)),
            Self::Binary(bytes) => Ok(bytes),
            Self::Json(value) => serde_json::to_vec(&value)
                .map(Bytes::from)
                .map_err(|e| Error::message_with_source("Unable to encode JSON", e)),
        }
    }

    /// Builds a JSON body from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Message`] if the value cannot be represented as JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| Error::message_with_source("Unable to encode JSON", e))
    }
}

impl From<String> for SendData {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for SendData {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Bytes> for SendData {
    fn from(bytes: Bytes) -> Self {
        Self::Binary(bytes)
    }
}

impl From<Vec<u8>> for SendData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(bytes))
    }
}

impl From<&[u8]> for SendData {
    fn from(bytes: &[u8]) -> Self {
        Self::Binary(Bytes::copy_from_slice(bytes))
    }
}

impl From<Value> for SendData {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

// ============================================================================
// SendOptions
// ============================================================================

/// Options for a delivery request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// How long the relay may hold the request waiting for a listener.
    pub timeout: Option<Duration>,

    /// Fail with [`Error::Undeliverable`] unless delivered within `timeout`.
    /// Requires a timeout.
    pub require_delivery: bool,
}

impl SendOptions {
    /// Creates options with no wait and no delivery requirement.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wait timeout.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets whether delivery is required.
    #[inline]
    #[must_use]
    pub fn with_require_delivery(mut self, require: bool) -> Self {
        self.require_delivery = require;
        self
    }

    /// Returns the wait hint header to send, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if delivery is required without a timeout.
    pub fn wait_header(&self) -> Result<Option<(&'static str, String)>> {
        let timeout = self.timeout.filter(|timeout| !timeout.is_zero());

        match (self.require_delivery, timeout) {
            (true, None) => Err(Error::config(
                "require_delivery can only be used with a timeout",
            )),
            (true, Some(timeout)) => Ok(Some((WAIT_HEADER, ceil_secs(timeout).to_string()))),
            (false, Some(timeout)) => {
                Ok(Some((SOFT_WAIT_HEADER, ceil_secs(timeout).to_string())))
            }
            (false, None) => Ok(None),
        }
    }
}

/// Whole seconds, rounded up.
fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

// ============================================================================
// SendResult
// ============================================================================

/// Outcome of a successful delivery request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendResult {
    /// Accepted by the relay, not yet delivered.
    Buffered,
    /// Delivered to at least one listener.
    Delivered,
}

impl SendResult {
    /// Maps the `X-Buoy-Delivery` header value. Anything unknown is buffered.
    #[must_use]
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(value) if value.eq_ignore_ascii_case("delivered") => Self::Delivered,
            _ => Self::Buffered,
        }
    }

    /// Returns the wire name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buffered => "buffered",
            Self::Delivered => "delivered",
        }
    }
}

impl fmt::Display for SendResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Sender
// ============================================================================

/// Sends messages to one channel.
#[derive(Clone)]
pub struct Sender {
    address: ChannelAddress,
    client: Arc<dyn HttpClient>,
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Sender {
    /// Creates a sender using the given HTTP client.
    #[must_use]
    pub fn new(address: ChannelAddress, client: Arc<dyn HttpClient>) -> Self {
        Self { address, client }
    }

    /// Creates a sender using a default [`ReqwestClient`].
    #[must_use]
    pub fn with_default_client(address: ChannelAddress) -> Self {
        Self::new(address, Arc::new(ReqwestClient::new()))
    }

    /// Returns the channel address.
    #[inline]
    #[must_use]
    pub fn address(&self) -> &ChannelAddress {
        &self.address
    }

    /// Sends one message.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if delivery is required without a timeout
    /// - [`Error::InvalidUrl`] if the delivery URL does not parse
    /// - [`Error::Undeliverable`] on status 408
    /// - [`Error::RequestCancelled`] on status 410
    /// - [`Error::UnexpectedStatus`] on any other non-2xx status
    /// - [`Error::Http`] if the request fails
    pub async fn send(
        &self,
        data: impl Into<SendData>,
        options: &SendOptions,
    ) -> Result<SendResult> {
        let wait = options.wait_header()?;
        let url = self.address.delivery_url()?;
        let body = data.into().into_body()?;

        let headers: Vec<(&str, String)> = wait.into_iter().collect();

        debug!(%url, len = body.len(), ?headers, "Sending message");

        let response = self.client.post(&url, &headers, body).await?;

        debug!(%url, status = response.status, "Delivery response");

        match response.status {
            _ if response.is_success() => {
                Ok(SendResult::from_header(response.header(DELIVERY_HEADER)))
            }
            STATUS_TIMEOUT => Err(Error::Undeliverable),
            STATUS_GONE => Err(Error::RequestCancelled),
            status => Err(Error::unexpected_status(status)),
        }
    }
}

/// Sends one message using a default [`ReqwestClient`].
///
/// # Errors
///
/// See [`Sender::send`].
pub async fn send(
    address: &ChannelAddress,
    data: impl Into<SendData>,
    options: &SendOptions,
) -> Result<SendResult> {
    Sender::with_default_client(address.clone())
        .send(data, options)
        .await
}

// ============================================================================
// Tests
// ============================================================================
