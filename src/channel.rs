//! Channel addressing.
//!
//! A channel is identified by the relay service base URL plus an opaque
//! channel id. Both the listen (WebSocket) URL and the delivery (HTTP) URL
//! are derived from the pair by swapping the scheme prefix.
//!
//! # Example
//!
//! ```
//! use buoy_client::ChannelAddress;
//!
//! let address = ChannelAddress::new("https://cb.anchor.link/", "abc123")?;
//! assert_eq!(address.listen_url()?.as_str(), "wss://cb.anchor.link/abc123?v=2");
//! assert_eq!(address.delivery_url()?.as_str(), "https://cb.anchor.link/abc123");
//! # Ok::<(), buoy_client::Error>(())
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Protocol version marker appended to the listen URL.
const PROTOCOL_VERSION_QUERY: &str = "v=2";

// ============================================================================
// ChannelAddress
// ============================================================================

/// Immutable `(service, channel)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelAddress {
    /// Relay service base URL, as given.
    service: String,
    /// Channel id.
    channel: String,
}

impl ChannelAddress {
    /// Creates a new channel address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the service URL or the channel id is empty.
    pub fn new(service: impl Into<String>, channel: impl Into<String>) -> Result<Self> {
        let service = service.into();
        let channel = channel.into();

        if service.trim().is_empty() {
            return Err(Error::config("Options must include a service url"));
        }
        if channel.is_empty() {
            return Err(Error::config("Options must include a channel name"));
        }

        Ok(Self { service, channel })
    }

    /// Creates an address for a fresh random channel (UUID v4).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the service URL is empty.
    pub fn random(service: impl Into<String>) -> Result<Self> {
        Self::new(service, Uuid::new_v4().to_string())
    }

    /// Returns the service base URL.
    #[inline]
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the channel id.
    #[inline]
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Returns a copy of this address pointing at another channel on the same service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the channel id is empty.
    pub fn with_channel(&self, channel: impl Into<String>) -> Result<Self> {
        Self::new(self.service.clone(), channel)
    }

    /// Returns the WebSocket URL a listener connects to.
    ///
    /// Format: `ws(s)://{service}/{channel}?v=2`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the derived URL does not parse.
    pub fn listen_url(&self) -> Result<Url> {
        let base = swap_scheme(&self.service, "http", "ws");
        let url = format!(
            "{}/{}?{PROTOCOL_VERSION_QUERY}",
            strip_trailing_slash(&base),
            self.channel
        );
        Ok(Url::parse(&url)?)
    }

    /// Returns the HTTP URL a delivery request posts to.
    ///
    /// Format: `http(s)://{service}/{channel}`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the derived URL does not parse.
    pub fn delivery_url(&self) -> Result<Url> {
        let base = swap_scheme(&self.service, "ws", "http");
        let url = format!("{}/{}", strip_trailing_slash(&base), self.channel);
        Ok(Url::parse(&url)?)
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", strip_trailing_slash(&self.service), self.channel)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Replaces a leading `from` with `to`, leaving the rest untouched.
///
/// `https` → `wss` and `wss` → `https` fall out of the prefix swap.
fn swap_scheme(service: &str, from: &str, to: &str) -> String {
    match service.strip_prefix(from) {
        Some(rest) => format!("{to}{rest}"),
        None => service.to_string(),
    }
}

/// Strips a single trailing slash.
fn strip_trailing_slash(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

// ============================================================================
// Tests
// ============================================================================
