//! Receive encodings.
//!
//! Every listener decodes payload frames with one fixed [`Encoding`].
//! Decoding is synchronous and stateless.
//!
//! | Encoding | Output | Failure |
//! |----------|--------|---------|
//! | `binary` | [`Message::Binary`] | never |
//! | `text` | [`Message::Text`] (lossy UTF-8) | never |
//! | `json` | [`Message::Json`] | malformed JSON |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// Encoding
// ============================================================================

/// How inbound payloads are decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Raw bytes, unchanged.
    Binary,
    /// UTF-8 text.
    #[default]
    Text,
    /// UTF-8 text parsed as JSON.
    Json,
}

impl Encoding {
    /// Decodes one payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Message`] if the encoding is [`Encoding::Json`] and
    /// the payload is not valid JSON.
    pub fn decode(self, payload: Bytes) -> Result<Message> {
        match self {
            Self::Binary => Ok(Message::Binary(payload)),
            Self::Text => Ok(Message::Text(String::from_utf8_lossy(&payload).into_owned())),
            Self::Json => {
                let text = String::from_utf8_lossy(&payload);
                serde_json::from_str(&text)
                    .map(Message::Json)
                    .map_err(|e| Error::message_with_source("Unable to decode JSON", e))
            }
        }
    }

    /// Returns the lowercase name of the encoding.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "binary" => Ok(Self::Binary),
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(Error::config(format!("Unknown encoding: {other}"))),
        }
    }
}

// ============================================================================
// Message
// ============================================================================

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Payload received with [`Encoding::Binary`].
    Binary(Bytes),
    /// Payload received with [`Encoding::Text`].
    Text(String),
    /// Payload received with [`Encoding::Json`].
    Json(Value),
}

impl Message {
    /// Returns the text if this is a text message.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the bytes if this is a binary message.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the JSON value if this is a JSON message.
    #[inline]
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Deserializes a JSON message into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Message`] if this is not a JSON message or the value
    /// does not match `T`.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        let value = self
            .as_json()
            .ok_or_else(|| Error::message("Message is not JSON"))?;
        T::deserialize(value)
            .map_err(|e| Error::message_with_source("Unable to deserialize message", e))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Self::Text(text) => f.write_str(text),
            Self::Json(value) => write!(f, "{value}"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
