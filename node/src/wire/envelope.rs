//! The message envelope exchanged between nodes.

use bytes::Bytes;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::RpcError;

/// Opaque encoded payload carried by an envelope.
///
/// The envelope layer never looks inside; only the registered handler or the
/// calling code decodes it into a concrete type.
pub type RawMessage = Bytes;

/// A request to invoke a procedure on the receiving node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Correlation id chosen by the caller.
    pub message_id: u32,
    /// Name of the procedure to invoke.
    pub procedure: String,
    /// Encoded argument value.
    #[serde(serialize_with = "serialize_payload")]
    pub argument: RawMessage,
}

/// The reply to a previously received [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// The id of the request being answered.
    pub message_id: u32,
    /// Encoded reply value.
    #[serde(serialize_with = "serialize_payload")]
    pub payload: RawMessage,
}

/// Writes a payload as a string when it is UTF-8, raw bytes otherwise.
///
/// Text codecs would otherwise spell every byte out as a number. `Bytes`
/// deserializes from either form.
fn serialize_payload<S>(payload: &RawMessage, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match std::str::from_utf8(payload) {
        Ok(text) => serializer.serialize_str(text),
        Err(_) => serializer.serialize_bytes(payload),
    }
}

/// Top-level wire message: exactly one of a request or a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Invoke a procedure.
    Request(Request),
    /// Answer a request.
    Response(Response),
}

impl Envelope {
    /// Returns the correlation id of either variant.
    #[must_use]
    pub fn message_id(&self) -> u32 {
        match self {
            Self::Request(request) => request.message_id,
            Self::Response(response) => response.message_id,
        }
    }
}

/// Serialized shape of an envelope: one optional member per variant.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct WireMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) query: Option<Request>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) reply: Option<Response>,
}

impl From<&Envelope> for WireMessage {
    fn from(envelope: &Envelope) -> Self {
        match envelope {
            Envelope::Request(request) => Self {
                query: Some(request.clone()),
                reply: None,
            },
            Envelope::Response(response) => Self {
                query: None,
                reply: Some(response.clone()),
            },
        }
    }
}

impl TryFrom<WireMessage> for Envelope {
    type Error = RpcError;

    fn try_from(message: WireMessage) -> Result<Self, Self::Error> {
        match (message.query, message.reply) {
            (Some(request), None) => Ok(Self::Request(request)),
            (None, Some(response)) => Ok(Self::Response(response)),
            (None, None) => Err(RpcError::InvalidMessage {
                reason: "envelope holds neither a request nor a response",
            }),
            (Some(_), Some(_)) => Err(RpcError::InvalidMessage {
                reason: "envelope holds both a request and a response",
            }),
        }
    }
}
