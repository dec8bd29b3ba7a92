//! Outbound calls to peers.

use std::net::SocketAddr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::lookup_host;
use tracing::{debug, warn};

use super::Node;
use crate::error::RpcError;
use crate::transport::DatagramTransport;
use crate::wire::{Envelope, MessageCodec, Request};

impl<T: DatagramTransport, C: MessageCodec> Node<T, C> {
    /// Invokes `procedure` on the node at `addr` and waits for its reply.
    ///
    /// With `timeout` set to a positive duration the wait is bounded; `None`
    /// falls back to [`Node::call_timeout`], and a zero duration or an unset
    /// default waits until a reply arrives or the node stops.
    ///
    /// The node never retransmits: a lost request or reply surfaces as a
    /// timeout, and callers wanting reliability re-invoke. The receive loop
    /// must be running for replies to be seen.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if no reply arrives in time, `Codec` if the
    /// argument cannot be encoded or the reply cannot be decoded into `R`,
    /// `DatagramTooLarge` if the request does not fit in one datagram,
    /// `Transport` if the send fails, and `Closed` if the node has stopped.
    pub async fn call<A, R>(
        &self,
        procedure: &str,
        addr: SocketAddr,
        args: &A,
        timeout: Option<Duration>,
    ) -> Result<R, RpcError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let transport = self.inner.transport()?;
        let argument = self.inner.codec.encode(args)?;

        // The guard deregisters the call on every exit path below.
        let (pending, reply_rx) = self.inner.calls.open(addr);
        let key = pending.key();

        let request = Envelope::Request(Request {
            message_id: key.message_id,
            procedure: procedure.to_string(),
            argument: argument.into(),
        });
        self.send_envelope(&transport, &request, addr).await?;
        drop(transport);
        debug!(call = %key, procedure, "Request sent");

        let limit = timeout.or_else(|| self.call_timeout());
        let payload = match limit.filter(|limit| !limit.is_zero()) {
            Some(limit) => tokio::time::timeout(limit, reply_rx).await.map_err(|_| {
                metrics::counter!("qrp_call_timeouts_total").increment(1);
                debug!(call = %key, procedure, ?limit, "Call timed out");
                RpcError::Timeout { after: limit }
            })?,
            None => reply_rx.await,
        }
        .map_err(|_| RpcError::Closed)?;

        self.inner.codec.decode(&payload).map_err(|e| {
            warn!(call = %key, procedure, error = %e, "Failed to decode reply");
            RpcError::from(e)
        })
    }

    /// Resolves `host` (`"name:port"`) and invokes `procedure` on the first
    /// address it resolves to.
    ///
    /// # Errors
    ///
    /// Returns `Unresolved` if the host has no addresses, plus every error
    /// [`Node::call`] returns.
    pub async fn call_host<A, R>(
        &self,
        procedure: &str,
        host: &str,
        args: &A,
        timeout: Option<Duration>,
    ) -> Result<R, RpcError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let addr = lookup_host(host)
            .await
            .map_err(|e| {
                warn!(host, error = %e, "Failed to resolve host");
                RpcError::Unresolved(host.to_string())
            })?
            .next()
            .ok_or_else(|| RpcError::Unresolved(host.to_string()))?;

        self.call(procedure, addr, args, timeout).await
    }
}
