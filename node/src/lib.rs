//! QRP Node - peer-to-peer remote procedure calls over datagrams.
//!
//! A [`Node`] both exposes named procedures for peers to invoke and invokes
//! procedures on peers. Requests and replies each travel in a single
//! datagram; replies are matched to outstanding calls by a
//! `(message id, peer address)` key, so the transport may reorder, drop or
//! duplicate packets freely.
//!
//! # Example
//!
//! ```no_run
//! use qrp_node::{Node, Service, ServiceMethods, MessageCodec};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Text {
//!     text: String,
//! }
//!
//! struct Echo;
//!
//! impl Service for Echo {
//!     fn procedures<C: MessageCodec>(methods: &mut ServiceMethods<Self, C>) {
//!         methods.method("Echo", |_: &Echo, args: Text, reply: &mut Text| {
//!             reply.text = args.text;
//!         });
//!     }
//! }
//!
//! # async fn example() -> Result<(), qrp_node::RpcError> {
//! let server = Node::bind("127.0.0.1:0", 512).await?;
//! server.register(Echo);
//! let server_addr = server.local_addr()?;
//! tokio::spawn({
//!     let server = server.clone();
//!     async move { server.serve().await }
//! });
//!
//! let client = Node::bind("127.0.0.1:0", 512).await?;
//! tokio::spawn({
//!     let client = client.clone();
//!     async move { client.serve().await }
//! });
//!
//! let reply: Text = client
//!     .call("Echo", server_addr, &Text { text: "hi".into() }, Some(Duration::from_secs(2)))
//!     .await?;
//! assert_eq!(reply.text, "hi");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Call-key allocation and the pending-reply table.
pub mod correlator;
/// Error types shared across the crate.
pub mod error;
/// Infrastructure components (config, telemetry).
pub mod infrastructure;
/// The node actor: lifecycle, client and server paths.
pub mod node;
/// Procedure registration and type-erased handlers.
pub mod registry;
/// Datagram transport abstraction.
pub mod transport;
/// Wire envelope, codec and byte-order normalization.
pub mod wire;

pub use correlator::CallKey;
pub use error::{RegistrationError, RpcError};
pub use node::{Lifecycle, Node};
pub use registry::{
    Param, Procedure, ProcedureRegistry, RegistrationReport, Service, ServiceMethods, Signature,
};
pub use transport::DatagramTransport;
pub use wire::{CodecError, Envelope, JsonCodec, MessageCodec, RawMessage, Request, Response};

/// Default datagram bound in bytes, small enough to avoid IP fragmentation on
/// common paths.
pub const DEFAULT_MAX_DATAGRAM_SIZE: usize = 512;
