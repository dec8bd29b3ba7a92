//! Pluggable payload serialization.
//!
//! [`MessageCodec`] turns envelopes and procedure arguments/replies into
//! bytes and back. [`JsonCodec`] is the default.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Error type for codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Failed to encode a value to bytes.
    #[error("encode error: {0}")]
    Encode(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Failed to decode bytes to a value.
    #[error("decode error: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Serialization format shared by a node and its peers.
///
/// Both ends of a call must agree on the codec. The trait requires
/// `Clone + Send + Sync + 'static` so a codec can be stored in the node and
/// copied into every registered procedure.
pub trait MessageCodec: Clone + Send + Sync + 'static {
    /// Encode a serializable value to bytes.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Encode` if serialization fails.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes into a value.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Decode` if deserialization fails.
    fn decode<T: DeserializeOwned>(&self, buf: &[u8]) -> Result<T, CodecError>;
}

/// JSON codec using `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl MessageCodec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode(Box::new(e)))
    }

    fn decode<T: DeserializeOwned>(&self, buf: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(buf).map_err(|e| CodecError::Decode(Box::new(e)))
    }
}
