//! JSON value codec backed by serde_json.

use crate::error::{CodecError, CodecResult};
use crate::ValueCodec;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// A JSON codec for any serde-compatible value type.
#[derive(Debug)]
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    /// Creates a new JSON codec.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ValueCodec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    type Value = T;

    fn encode(&self, value: &T) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<T> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
    }
}
