//! Identity codec for raw byte values.

use crate::error::CodecResult;
use crate::ValueCodec;

/// The identity codec: values are the raw trie payload bytes.
///
/// This is the default codec when no value encoding is configured. Decoding
/// is a plain copy, so it never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl BytesCodec {
    /// Creates a new identity codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ValueCodec for BytesCodec {
    type Value = Vec<u8>;

    fn encode(&self, value: &Vec<u8>) -> CodecResult<Vec<u8>> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}
