//! Serving lifecycle of a node.

use tracing::info;

use super::NodeInner;
use crate::error::RpcError;
use crate::transport::DatagramTransport;
use crate::wire::MessageCodec;

/// Lifecycle state of a [`Node`](super::Node).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created, receive loop not started.
    Idle,
    /// The receive loop is running.
    Serving,
    /// The loop has exited and the transport has been released.
    Stopped,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Serving => write!(f, "serving"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

impl Lifecycle {
    /// Transition taken when the receive loop starts.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyServing` from `Serving` and `Closed` from `Stopped`.
    pub fn start(self) -> Result<Self, RpcError> {
        match self {
            Self::Idle => Ok(Self::Serving),
            Self::Serving => Err(RpcError::AlreadyServing),
            Self::Stopped => Err(RpcError::Closed),
        }
    }
}

/// Releases the node's serving resources when the receive loop exits.
pub(super) struct ServeGuard<'a, T: DatagramTransport, C: MessageCodec> {
    pub(super) inner: &'a NodeInner<T, C>,
}

impl<T: DatagramTransport, C: MessageCodec> Drop for ServeGuard<'_, T, C> {
    fn drop(&mut self) {
        self.inner.release();
        info!("Receive loop exited, transport released");
    }
}
