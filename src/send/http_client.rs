//! HTTP client abstraction for delivery requests.
//!
//! The sender only ever needs one operation, a `POST` with a few headers,
//! so that is all [`HttpClient`] exposes. [`ReqwestClient`] is the default
//! implementation.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::Result;

// ============================================================================
// HttpResponse
// ============================================================================

/// A minimal HTTP response.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,

    /// Response headers (lowercase names).
    pub headers: Vec<(String, String)>,

    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Creates a response with a status and no headers or body.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_lowercase(), value.into()));
        self
    }

    /// Looks up a header by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` for a 2xx status.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// A minimal async HTTP client.
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Sends a `POST` request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) if no response was received.
    async fn post(&self, url: &Url, headers: &[(&str, String)], body: Bytes)
    -> Result<HttpResponse>;
}

// ============================================================================
// ReqwestClient
// ============================================================================

/// [`reqwest`]-backed [`HttpClient`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client with an overall request timeout.
    ///
    /// The relay holds delivery requests open while waiting for a listener,
    /// so keep this above any wait hint sent with the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) if the client cannot be
    /// built, for example when no TLS backend can be initialised.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { inner })
    }

    /// Wraps an existing reqwest client.
    #[must_use]
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn post(
        &self,
        url: &Url,
        headers: &[(&str, String)],
        body: Bytes,
    ) -> Result<HttpResponse> {
        let mut builder = self.inner.post(url.clone());
        for (name, value) in headers {
            builder = builder.header(*name, value.as_str());
        }

        let response = builder.body(body).send().await?;
        let status = response.status().as_u16();

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_lowercase(), value.to_string()))
            })
            .collect();

        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
