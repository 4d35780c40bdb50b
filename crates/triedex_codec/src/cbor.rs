//! CBOR value codec backed by ciborium.

use crate::error::{CodecError, CodecResult};
use crate::ValueCodec;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// A CBOR codec for any serde-compatible value type.
///
/// CBOR payloads are smaller than JSON and preserve byte strings, which
/// makes this the better choice for binary-heavy values.
#[derive(Debug)]
pub struct CborCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> CborCodec<T> {
    /// Creates a new CBOR codec.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for CborCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ValueCodec for CborCodec<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    type Value = T;

    fn encode(&self, value: &T) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
        Ok(buf)
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<T> {
        ciborium::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Payload {
        id: u64,
        data: Vec<u8>,
    }

    #[test]
    fn cbor_round_trip() {
        let codec = CborCodec::<Payload>::new();
        let payload = Payload {
            id: 7,
            data: vec![0xde, 0xad],
        };
        let bytes = codec.encode(&payload).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), payload);
    }

    #[test]
    fn truncated_cbor_is_an_error() {
        let codec = CborCodec::<Payload>::new();
        let payload = Payload {
            id: 7,
            data: vec![1, 2, 3],
        };
        let bytes = codec.encode(&payload).unwrap();
        let err = codec.decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, CodecError::DecodingFailed { .. }));
    }
}
