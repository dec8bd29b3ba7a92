//! Error types for the RPC node.
//!
//! [`RpcError`] covers every failure the node reports: transport failures,
//! lifecycle misuse, malformed or unmatched datagrams, and call timeouts.
//! [`RegistrationError`] describes why a candidate procedure was refused.

use std::time::Duration;

use crate::wire::CodecError;

/// Errors produced by node operations and datagram processing.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The transport could not be bound, read from, or written to.
    #[error("Transport Error: {0}")]
    Transport(#[from] std::io::Error),
    /// `serve` was invoked while the receive loop is already running.
    #[error("Node Already Serving")]
    AlreadyServing,
    /// The node has stopped and released its transport.
    #[error("Node Closed")]
    Closed,
    /// A decoded envelope holds neither a request nor a response, or both.
    #[error("Invalid Message: {reason}")]
    InvalidMessage {
        /// What was wrong with the envelope.
        reason: &'static str,
    },
    /// A request named a procedure that is not registered.
    #[error("Bad Procedure: {name}")]
    BadProcedure {
        /// The requested procedure name.
        name: String,
    },
    /// A response arrived for a call key with no pending entry.
    #[error("Invalid Message Mapping: no pending call for message {message_id}")]
    InvalidMessageMapping {
        /// The message id carried by the orphaned response.
        message_id: u32,
    },
    /// No matching reply arrived within the call timeout.
    #[error("Timeout after {after:?}")]
    Timeout {
        /// The configured timeout that elapsed.
        after: Duration,
    },
    /// A payload or envelope could not be encoded or decoded.
    #[error("Codec Error: {0}")]
    Codec(#[from] CodecError),
    /// An encoded envelope does not fit in a single datagram.
    #[error("Datagram Too Large: {size} bytes exceeds limit of {limit}")]
    DatagramTooLarge {
        /// Encoded envelope size.
        size: usize,
        /// Configured maximum datagram size.
        limit: usize,
    },
    /// A host name did not resolve to any socket address.
    #[error("Unresolved Address: {0}")]
    Unresolved(String),
    /// A procedure failed registration.
    #[error("Registration Error: {0}")]
    Registration(#[from] RegistrationError),
}

impl RpcError {
    /// Returns `true` if the call timed out waiting for a reply.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if re-invoking the call may succeed.
    ///
    /// The node never retransmits on its own; callers wanting reliability
    /// re-invoke on these errors.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport(_) => true,
            Self::AlreadyServing
            | Self::Closed
            | Self::InvalidMessage { .. }
            | Self::BadProcedure { .. }
            | Self::InvalidMessageMapping { .. }
            | Self::Codec(_)
            | Self::DatagramTooLarge { .. }
            | Self::Unresolved(_)
            | Self::Registration(_) => false,
        }
    }
}

/// Reasons a candidate procedure is refused at registration time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// The procedure name is empty or whitespace.
    #[error("procedure name cannot be empty")]
    EmptyName,
    /// The procedure does not take exactly an argument and a reply.
    #[error("method {procedure} has wrong number of ins: {found}")]
    WrongArity {
        /// Procedure name.
        procedure: String,
        /// Number of parameters found, excluding the receiver.
        found: usize,
    },
    /// The argument type is not exported.
    #[error("method {procedure} argument type not exported: {type_name}")]
    ArgumentNotExported {
        /// Procedure name.
        procedure: String,
        /// Offending type.
        type_name: &'static str,
    },
    /// The reply is not taken by mutable reference.
    #[error("method {procedure} reply type not a mutable reference: {type_name}")]
    ReplyNotMutable {
        /// Procedure name.
        procedure: String,
        /// Offending type.
        type_name: &'static str,
    },
    /// The reply type is not exported.
    #[error("method {procedure} reply type not exported: {type_name}")]
    ReplyNotExported {
        /// Procedure name.
        procedure: String,
        /// Offending type.
        type_name: &'static str,
    },
}
