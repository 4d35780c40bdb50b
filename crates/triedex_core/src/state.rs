//! Durable progress state and its wire format.
//!
//! The progress state is the only at-rest format the engine owns. It is a
//! small binary record:
//!
//! ```text
//! ProgressState {
//!     from: varint          // start of the unprocessed range (inclusive)
//!     to: varint            // end of the range being processed (exclusive);
//!                           // 0 encodes "absent" (catch up to current)
//!     checkpoint: bytes     // opaque diff-cursor position; rest of buffer,
//!                           // empty when absent
//! }
//! ```
//!
//! Varints are LEB128. An empty buffer decodes to the "never indexed" state
//! `{ from: 0 }`. A truncated varint is corruption and must be reported,
//! never defaulted.

use crate::error::{IndexError, IndexResult};

/// The durable checkpoint tracking how much history has been indexed.
///
/// ## Invariants
///
/// - `from <= to` whenever `to` is present
/// - `checkpoint` is only meaningful together with the `(from, to)` pair it
///   was captured under; it is never persisted without one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    /// Version marking the start of the unprocessed range (inclusive).
    pub from: u64,
    /// Version marking the end of the range being processed (exclusive).
    /// Absent means "catch up to the trie's current version".
    pub to: Option<u64>,
    /// Opaque diff-cursor position, present only when a batch boundary fell
    /// mid-range.
    pub checkpoint: Option<Vec<u8>>,
}

impl ProgressState {
    /// Returns true if nothing has ever been indexed.
    pub fn is_initial(&self) -> bool {
        self.from == 0 && self.to.is_none() && self.checkpoint.is_none()
    }

    /// Encodes the state to its binary wire format.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(20);
        encode_varint(self.from, &mut buf);
        encode_varint(self.to.unwrap_or(0), &mut buf);
        if let Some(checkpoint) = &self.checkpoint {
            buf.extend_from_slice(checkpoint);
        }
        buf
    }

    /// Decodes a state from its binary wire format.
    ///
    /// An empty buffer decodes to [`ProgressState::default`].
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::StateCorrupt`] if a varint is truncated or
    /// overlong.
    pub fn decode(bytes: &[u8]) -> IndexResult<Self> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let mut pos = 0;
        let from = decode_varint(bytes, &mut pos)?;
        let to = match decode_varint(bytes, &mut pos)? {
            0 => None,
            v => Some(v),
        };
        let checkpoint = if pos < bytes.len() {
            Some(bytes[pos..].to_vec())
        } else {
            None
        };
        Ok(Self {
            from,
            to,
            checkpoint,
        })
    }
}

/// Appends a LEB128 varint to the buffer.
fn encode_varint(value: u64, out: &mut Vec<u8>) {
    let mut v = value;
    loop {
        let mut byte = (v & 0x7F) as u8;
        v >>= 7;
        if v != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if v == 0 {
            break;
        }
    }
}

/// Decodes a LEB128 varint from the buffer at `pos`.
fn decode_varint(data: &[u8], pos: &mut usize) -> IndexResult<u64> {
    let mut result = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = *data
            .get(*pos)
            .ok_or_else(|| IndexError::state_corrupt("truncated varint"))?;
        *pos += 1;
        if shift == 63 && byte > 1 {
            return Err(IndexError::state_corrupt("varint overflows u64"));
        }
        result |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift > 63 {
            return Err(IndexError::state_corrupt("varint overflows u64"));
        }
    }
}
