//! Inbound datagram processing: request dispatch and reply correlation.

use std::net::SocketAddr;

use tracing::{debug, trace};

use super::Node;
use crate::correlator::CallKey;
use crate::error::RpcError;
use crate::transport::DatagramTransport;
use crate::wire::{decode_envelope, Envelope, MessageCodec, Request, Response};

impl<T: DatagramTransport, C: MessageCodec> Node<T, C> {
    /// Processes one received datagram from `from`.
    ///
    /// Requests are dispatched to the registered procedure and answered;
    /// responses are delivered to the matching pending call.
    ///
    /// # Errors
    ///
    /// Returns `Codec` or `InvalidMessage` for undecodable datagrams,
    /// `BadProcedure` for unknown procedures (no reply is sent), and
    /// `InvalidMessageMapping` for responses with no pending call.
    pub async fn handle_datagram(&self, datagram: &[u8], from: SocketAddr) -> Result<(), RpcError> {
        match decode_envelope(&self.inner.codec, datagram)? {
            Envelope::Request(request) => self.dispatch_request(request, from).await,
            Envelope::Response(response) => self.deliver_reply(response, from),
        }
    }

    async fn dispatch_request(&self, request: Request, from: SocketAddr) -> Result<(), RpcError> {
        let Request {
            message_id,
            procedure: name,
            argument,
        } = request;

        let procedure = self
            .inner
            .registry
            .get(&name)
            .ok_or_else(|| RpcError::BadProcedure { name: name.clone() })?;

        trace!(%from, message_id, procedure = %name, "Invoking procedure");
        let payload = procedure.invoke(&argument)?;
        metrics::counter!("qrp_requests_dispatched_total").increment(1);

        let transport = self.inner.transport()?;
        let reply = Envelope::Response(Response {
            message_id,
            payload,
        });
        self.send_envelope(&transport, &reply, from).await
    }

    fn deliver_reply(&self, response: Response, from: SocketAddr) -> Result<(), RpcError> {
        let key = CallKey::new(response.message_id, from);

        match self.inner.calls.deliver(&key, response.payload) {
            Ok(()) => {
                debug!(call = %key, "Delivered reply");
                metrics::counter!("qrp_replies_delivered_total").increment(1);
                Ok(())
            }
            Err(_) => {
                metrics::counter!("qrp_replies_orphaned_total").increment(1);
                Err(RpcError::InvalidMessageMapping {
                    message_id: response.message_id,
                })
            }
        }
    }
}
