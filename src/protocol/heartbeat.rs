//! Heartbeat sub-protocol.
//!
//! The relay multiplexes a tiny ping/pong exchange over the payload stream.
//! A ping is four bytes: the two-byte magic, the ping tag and a sequence
//! number. The client answers with the same magic, the pong tag and the
//! sequence number echoed back unchanged.
//!
//! ```text
//! ping: 0x42 0x42 0x01 seq
//! pong: 0x42 0x42 0x02 seq
//! ```
//!
//! Anything after the first four bytes of a ping frame is ordinary payload.

// ============================================================================
// Imports
// ============================================================================

use bytes::Bytes;

// ============================================================================
// Constants
// ============================================================================

/// Frame magic shared by ping and pong.
pub const MAGIC: [u8; 2] = [0x42, 0x42];

/// Tag byte of a ping frame.
pub const PING_TAG: u8 = 0x01;

/// Tag byte of a pong frame.
pub const PONG_TAG: u8 = 0x02;

/// Length of a heartbeat frame in bytes.
pub const HEARTBEAT_LEN: usize = 4;

// ============================================================================
// Filtered
// ============================================================================

/// Result of running an inbound frame through [`filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filtered {
    /// The frame started with a heartbeat ping.
    Heartbeat {
        /// Pong frame to send back on the same connection.
        reply: Bytes,
        /// Payload bytes that followed the ping, usually empty.
        rest: Bytes,
    },
    /// Ordinary payload, passed through untouched.
    Payload(Bytes),
}

impl Filtered {
    /// Returns the payload left for the decoder, if any.
    #[must_use]
    pub fn into_payload(self) -> Option<Bytes> {
        match self {
            Self::Heartbeat { rest, .. } if rest.is_empty() => None,
            Self::Heartbeat { rest, .. } => Some(rest),
            Self::Payload(payload) => Some(payload),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Splits a heartbeat ping off the front of an inbound frame.
#[must_use]
pub fn filter(frame: Bytes) -> Filtered {
    match sequence(&frame) {
        Some(seq) => Filtered::Heartbeat {
            reply: pong(seq),
            rest: frame.slice(HEARTBEAT_LEN..),
        },
        None => Filtered::Payload(frame),
    }
}

/// Returns the sequence byte if `frame` starts with a ping.
#[inline]
#[must_use]
pub fn sequence(frame: &[u8]) -> Option<u8> {
    match frame {
        [m0, m1, tag, seq, ..] if [*m0, *m1] == MAGIC && *tag == PING_TAG => Some(*seq),
        _ => None,
    }
}

/// Builds a ping frame.
#[inline]
#[must_use]
pub fn ping(seq: u8) -> Bytes {
    Bytes::copy_from_slice(&[MAGIC[0], MAGIC[1], PING_TAG, seq])
}

/// Builds a pong frame.
#[inline]
#[must_use]
pub fn pong(seq: u8) -> Bytes {
    Bytes::copy_from_slice(&[MAGIC[0], MAGIC[1], PONG_TAG, seq])
}

// ============================================================================
// Tests
// ============================================================================
