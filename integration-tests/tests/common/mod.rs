//! Shared test utilities for end-to-end tests.
//!
//! Provides serving nodes on loopback, the `Echo` service, and a raw peer
//! that speaks the wire format by hand so tests can control exactly which
//! replies are sent, from where, and in what order.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Result};
use qrp_node::wire::{decode_envelope, encode_envelope};
use qrp_node::{
    Envelope, JsonCodec, MessageCodec, Node, Request, Response, Service, ServiceMethods,
};
use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;

/// Payload of the `Echo` procedure.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Text {
    #[serde(rename = "Text")]
    pub text: String,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Service exposing `Echo`.
pub struct Echo;

impl Service for Echo {
    fn procedures<C: MessageCodec>(methods: &mut ServiceMethods<Self, C>) {
        methods.method("Echo", |_: &Echo, args: Text, reply: &mut Text| {
            reply.text = args.text;
        });
    }
}

/// Binds a node on loopback and runs its receive loop in the background.
pub async fn spawn_node() -> Result<Node> {
    let node = Node::bind("127.0.0.1:0", qrp_node::DEFAULT_MAX_DATAGRAM_SIZE).await?;
    tokio::spawn({
        let node = node.clone();
        async move { node.serve().await }
    });
    Ok(node)
}

/// A serving node with `Echo` registered, and its address.
pub async fn spawn_echo_node() -> Result<(Node, SocketAddr)> {
    let node = spawn_node().await?;
    let report = node.register(Echo);
    if !report.is_complete() {
        bail!("Echo registration rejected: {:?}", report.rejected);
    }
    let addr = node.local_addr()?;
    Ok((node, addr))
}

/// Polls `node` until `expected` calls are pending or two seconds pass.
pub async fn wait_for_pending(node: &Node, expected: usize) -> Result<()> {
    for _ in 0..400 {
        if node.pending_calls() == expected {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    bail!(
        "expected {expected} pending calls, found {}",
        node.pending_calls()
    )
}

/// A peer driven by hand over a plain UDP socket.
pub struct RawPeer {
    pub socket: UdpSocket,
}

impl RawPeer {
    pub async fn bind() -> Result<Self> {
        Ok(Self {
            socket: UdpSocket::bind("127.0.0.1:0").await?,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receives the next request, returning it with the sender's address.
    pub async fn recv_request(&self) -> Result<(Request, SocketAddr)> {
        let mut buf = vec![0u8; qrp_node::DEFAULT_MAX_DATAGRAM_SIZE];
        let (len, from) = self.socket.recv_from(&mut buf).await?;
        match decode_envelope(&JsonCodec, &buf[..len])? {
            Envelope::Request(request) => Ok((request, from)),
            Envelope::Response(response) => {
                bail!("expected a request, got reply {}", response.message_id)
            }
        }
    }

    /// Sends a reply with `message_id` carrying `reply` to `target`.
    pub async fn send_reply<R: Serialize>(
        &self,
        message_id: u32,
        reply: &R,
        target: SocketAddr,
    ) -> Result<()> {
        let datagram = reply_datagram(message_id, reply)?;
        self.socket.send_to(&datagram, target).await?;
        Ok(())
    }
}

/// Encodes a reply envelope.
pub fn reply_datagram<R: Serialize>(message_id: u32, reply: &R) -> Result<Vec<u8>> {
    let payload = JsonCodec.encode(reply)?;
    let envelope = Envelope::Response(Response {
        message_id,
        payload: payload.into(),
    });
    Ok(encode_envelope(&JsonCodec, &envelope)?.to_vec())
}
