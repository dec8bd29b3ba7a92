//! Datagram transport used by a node.
//!
//! The node needs only a connectionless, packet-oriented endpoint: receive
//! one datagram with its sender, send one datagram to an address. Ordering,
//! delivery and duplicate suppression are not expected of it. The endpoint is
//! closed when the last handle to it is dropped.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

/// A connectionless datagram endpoint.
pub trait DatagramTransport: Send + Sync + 'static {
    /// Receives one datagram into `buf`, returning its length and sender.
    ///
    /// Bytes beyond `buf.len()` are the transport's concern and may be
    /// discarded.
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;

    /// Sends one datagram to `target`, returning the number of bytes written.
    fn send_to(
        &self,
        buf: &[u8],
        target: SocketAddr,
    ) -> impl Future<Output = io::Result<usize>> + Send;

    /// Returns the local address the endpoint is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be determined.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl DatagramTransport for UdpSocket {
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf).await
    }

    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, target).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }
}
