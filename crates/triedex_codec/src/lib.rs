//! # Triedex Codec
//!
//! Pluggable value codecs for Triedex.
//!
//! The trie stores opaque byte payloads; an indexer decodes them into typed
//! values before handing them to the mapping function. This crate defines the
//! [`ValueCodec`] trait and three implementations:
//!
//! - [`BytesCodec`] - identity codec, values stay raw bytes
//! - [`JsonCodec`] - JSON via serde_json
//! - [`CborCodec`] - CBOR via ciborium
//!
//! ## Usage
//!
//! ```
//! use triedex_codec::{JsonCodec, ValueCodec};
//!
//! #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
//! struct Planet { name: String }
//!
//! let codec = JsonCodec::<Planet>::new();
//! let bytes = codec.encode(&Planet { name: "earth".into() }).unwrap();
//! let planet = codec.decode(&bytes).unwrap();
//! assert_eq!(planet.name, "earth");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bytes;
mod cbor;
mod error;
mod json;

pub use bytes::BytesCodec;
pub use cbor::CborCodec;
pub use error::{CodecError, CodecResult};
pub use json::JsonCodec;

/// A bidirectional codec between typed values and trie byte payloads.
///
/// Codecs are shared across threads by the indexer, so implementations must
/// be `Send + Sync` and stateless with respect to individual calls.
pub trait ValueCodec: Send + Sync {
    /// The decoded value type.
    type Value;

    /// Encodes a value to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    fn encode(&self, value: &Self::Value) -> CodecResult<Vec<u8>>;

    /// Decodes bytes into a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid encoding.
    fn decode(&self, bytes: &[u8]) -> CodecResult<Self::Value>;
}
