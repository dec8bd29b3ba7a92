//! The node actor.
//!
//! A [`Node`] owns a datagram transport, a procedure registry and the
//! pending-call table. Its receive loop ([`Node::serve`]) reads one datagram
//! at a time and hands each to its own task, so requests and replies are
//! processed concurrently with each other and with the next receive.
//!
//! Three independent locks guard the shared state:
//! - the call table (message-id counter and pending slots),
//! - the procedure registry,
//! - the send path, serializing every outbound datagram.

mod client;
mod dispatch;
mod lifecycle;

pub use lifecycle::Lifecycle;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tokio::net::{ToSocketAddrs, UdpSocket};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::correlator::CallTable;
use crate::error::RpcError;
use crate::infrastructure::config::NodeSettings;
use crate::registry::{Procedure, ProcedureRegistry, RegistrationReport, Service};
use crate::transport::DatagramTransport;
use crate::wire::{encode_envelope, Envelope, JsonCodec, MessageCodec};
use lifecycle::ServeGuard;

/// Shared state behind every clone of a [`Node`].
pub(crate) struct NodeInner<T: DatagramTransport, C: MessageCodec> {
    transport: RwLock<Option<Arc<T>>>,
    max_datagram_size: usize,
    call_timeout: Mutex<Option<Duration>>,
    codec: C,
    registry: ProcedureRegistry,
    calls: CallTable,
    send_lock: tokio::sync::Mutex<()>,
    lifecycle: Mutex<Lifecycle>,
    stop_tx: watch::Sender<bool>,
}

impl<T: DatagramTransport, C: MessageCodec> NodeInner<T, C> {
    fn transport(&self) -> Result<Arc<T>, RpcError> {
        self.transport.read().clone().ok_or(RpcError::Closed)
    }

    /// Moves the node to `Stopped`, drops its transport handle and fails every
    /// pending call.
    fn release(&self) {
        *self.lifecycle.lock() = Lifecycle::Stopped;
        self.transport.write().take();
        self.calls.clear();
    }
}

/// A peer-to-peer RPC node.
///
/// Cloning a `Node` is cheap and yields another handle to the same node.
pub struct Node<T: DatagramTransport = UdpSocket, C: MessageCodec = JsonCodec> {
    inner: Arc<NodeInner<T, C>>,
}

impl<T: DatagramTransport, C: MessageCodec> Clone for Node<T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: DatagramTransport, C: MessageCodec> std::fmt::Debug for Node<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("lifecycle", &self.lifecycle())
            .field("max_datagram_size", &self.inner.max_datagram_size)
            .field("procedures", &self.inner.registry.names())
            .field("pending_calls", &self.inner.calls.len())
            .finish_non_exhaustive()
    }
}

impl Node<UdpSocket, JsonCodec> {
    /// Binds a UDP socket at `addr` and creates a node on it.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::Transport` if the socket cannot be bound.
    pub async fn bind(
        addr: impl ToSocketAddrs,
        max_datagram_size: usize,
    ) -> Result<Self, RpcError> {
        let socket = UdpSocket::bind(addr).await.map_err(|e| {
            error!(error = %e, "Failed to bind UDP socket");
            RpcError::Transport(e)
        })?;
        Ok(Self::new(socket, max_datagram_size))
    }

    /// Binds a node from configuration.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::Transport` if the socket cannot be bound.
    pub async fn from_settings(settings: &NodeSettings) -> Result<Self, RpcError> {
        let node = Self::bind(settings.listen_address.as_str(), settings.max_datagram_size).await?;
        node.set_call_timeout(settings.call_timeout());
        Ok(node)
    }
}

impl<T: DatagramTransport> Node<T, JsonCodec> {
    /// Creates a node on `transport` using the JSON codec.
    #[must_use]
    pub fn new(transport: T, max_datagram_size: usize) -> Self {
        Self::with_codec(transport, max_datagram_size, JsonCodec)
    }
}

impl<T: DatagramTransport, C: MessageCodec> Node<T, C> {
    /// Creates a node on `transport` with a custom codec.
    ///
    /// Peers must use the same codec.
    #[must_use]
    pub fn with_codec(transport: T, max_datagram_size: usize, codec: C) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(NodeInner {
                transport: RwLock::new(Some(Arc::new(transport))),
                max_datagram_size,
                call_timeout: Mutex::new(None),
                codec,
                registry: ProcedureRegistry::new(),
                calls: CallTable::new(),
                send_lock: tokio::sync::Mutex::new(()),
                lifecycle: Mutex::new(Lifecycle::Idle),
                stop_tx,
            }),
        }
    }

    /// Registers every procedure `receiver` declares.
    ///
    /// Malformed candidates are logged and skipped; see [`RegistrationReport`].
    pub fn register<S: Service>(&self, receiver: S) -> RegistrationReport {
        self.inner
            .registry
            .register_service(receiver, self.inner.codec.clone())
    }

    /// Registers a single hand-written procedure.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::Registration` if the procedure's shape is invalid.
    pub fn register_procedure(&self, procedure: impl Procedure + 'static) -> Result<(), RpcError> {
        self.inner.registry.register(procedure)?;
        Ok(())
    }

    /// Names of the registered procedures, sorted.
    #[must_use]
    pub fn procedures(&self) -> Vec<String> {
        self.inner.registry.names()
    }

    /// The local address of the node's transport.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::Closed` once the transport has been released, or
    /// `RpcError::Transport` if the address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr, RpcError> {
        Ok(self.inner.transport()?.local_addr()?)
    }

    /// The configured datagram bound in bytes.
    #[must_use]
    pub fn max_datagram_size(&self) -> usize {
        self.inner.max_datagram_size
    }

    /// Timeout applied to calls made without an explicit one.
    #[must_use]
    pub fn call_timeout(&self) -> Option<Duration> {
        *self.inner.call_timeout.lock()
    }

    /// Sets the timeout applied to calls made without an explicit one.
    /// `None` or a zero duration waits unbounded.
    pub fn set_call_timeout(&self, timeout: Option<Duration>) {
        *self.inner.call_timeout.lock() = timeout.filter(|limit| !limit.is_zero());
    }

    /// Number of calls currently waiting for a reply.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.inner.calls.len()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        *self.inner.lifecycle.lock()
    }

    /// Returns `true` while the receive loop is running.
    #[must_use]
    pub fn is_serving(&self) -> bool {
        self.lifecycle() == Lifecycle::Serving
    }

    /// Runs the receive loop until [`Node::shutdown`] or a transport error.
    ///
    /// Only one loop may run per node. When the loop exits, for any reason,
    /// the node releases its transport, fails pending calls with
    /// `RpcError::Closed`, and becomes `Stopped`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyServing` if the loop is already running, `Closed` if
    /// the node has stopped, and `Transport` if a receive fails.
    pub async fn serve(&self) -> Result<(), RpcError> {
        {
            let mut lifecycle = self.inner.lifecycle.lock();
            *lifecycle = lifecycle.start()?;
        }
        let _guard = ServeGuard { inner: &self.inner };

        let transport = self.inner.transport()?;
        let mut stop_rx = self.inner.stop_tx.subscribe();
        let mut buf = vec![0u8; self.inner.max_datagram_size];

        info!(
            local_addr = ?transport.local_addr().ok(),
            max_datagram_size = self.inner.max_datagram_size,
            "Node serving"
        );

        loop {
            let stopped = *stop_rx.borrow_and_update();
            if stopped {
                info!("Shutdown requested, leaving receive loop");
                return Ok(());
            }

            tokio::select! {
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                }
                received = transport.recv_from(&mut buf) => {
                    let (len, from) = received.map_err(|e| {
                        error!(error = %e, "Failed to read from transport");
                        RpcError::Transport(e)
                    })?;
                    if len == 0 {
                        continue;
                    }
                    metrics::counter!("qrp_datagrams_received_total").increment(1);

                    let datagram = Bytes::copy_from_slice(&buf[..len]);
                    let node = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = node.handle_datagram(&datagram, from).await {
                            log_processing_error(&e, from);
                        }
                    });
                }
            }
        }
    }

    /// Stops the receive loop.
    ///
    /// A node that never served releases its transport immediately. Calls
    /// still waiting for replies fail with `RpcError::Closed`.
    pub fn shutdown(&self) {
        let lifecycle = *self.inner.lifecycle.lock();
        match lifecycle {
            Lifecycle::Idle => {
                self.inner.stop_tx.send_replace(true);
                self.inner.release();
                info!("Node stopped before serving");
            }
            Lifecycle::Serving => {
                self.inner.stop_tx.send_replace(true);
            }
            Lifecycle::Stopped => {}
        }
    }

    /// Encodes `envelope` and sends it to `target` under the send lock.
    async fn send_envelope(
        &self,
        transport: &T,
        envelope: &Envelope,
        target: SocketAddr,
    ) -> Result<(), RpcError> {
        let datagram = encode_envelope(&self.inner.codec, envelope)?;
        if datagram.len() > self.inner.max_datagram_size {
            return Err(RpcError::DatagramTooLarge {
                size: datagram.len(),
                limit: self.inner.max_datagram_size,
            });
        }

        let _sending = self.inner.send_lock.lock().await;
        transport.send_to(&datagram, target).await?;
        Ok(())
    }
}

fn log_processing_error(error: &RpcError, peer: SocketAddr) {
    match error {
        RpcError::InvalidMessageMapping { message_id } => {
            debug!(%peer, message_id, "Dropped orphaned reply");
        }
        RpcError::BadProcedure { name } => {
            debug!(%peer, procedure = %name, "Dropped request for unknown procedure");
        }
        _ => warn!(%peer, error = %error, "Error processing message"),
    }
}
