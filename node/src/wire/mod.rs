//! Wire format for node-to-node messages.
//!
//! Encoding runs envelope → [`MessageCodec`] → [`to_network_order`]; decoding
//! runs the same steps in reverse. Argument and reply payloads inside an
//! envelope are produced by the same codec.

pub mod byte_order;
pub mod codec;
pub mod envelope;

pub use byte_order::{from_network_order, to_network_order};
pub use codec::{CodecError, JsonCodec, MessageCodec};
pub use envelope::{Envelope, RawMessage, Request, Response};

use bytes::Bytes;

use crate::error::RpcError;
use envelope::WireMessage;

/// Encodes an envelope into bytes ready for transmission.
///
/// # Errors
///
/// Returns `CodecError::Encode` if the codec cannot serialize the envelope.
pub fn encode_envelope<C: MessageCodec>(
    codec: &C,
    envelope: &Envelope,
) -> Result<Bytes, CodecError> {
    let serialized = codec.encode(&WireMessage::from(envelope))?;
    Ok(to_network_order(&serialized))
}

/// Decodes received bytes into an envelope.
///
/// # Errors
///
/// Returns `RpcError::Codec` if the bytes are not a serialized envelope, and
/// `RpcError::InvalidMessage` if the envelope holds neither or both variants.
pub fn decode_envelope<C: MessageCodec>(codec: &C, datagram: &[u8]) -> Result<Envelope, RpcError> {
    let serialized = from_network_order(datagram);
    let message: WireMessage = codec.decode(&serialized)?;
    Envelope::try_from(message)
}
