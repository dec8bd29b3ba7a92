//! Type-erased procedure handlers.

use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::RpcError;
use crate::wire::{MessageCodec, RawMessage};

/// One declared parameter of a procedure, excluding the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    /// Rust type name of the parameter.
    pub type_name: &'static str,
    /// Whether the type is visible to peers, i.e. part of the wire contract.
    ///
    /// [`Param::value`] and [`Param::mut_ref`] always set this, so typed
    /// [`Method`]s always pass the visibility checks. Only hand-written
    /// [`Procedure`]s can declare an unexported parameter, through
    /// [`Param::unexported`].
    pub exported: bool,
    /// Whether the parameter is taken by mutable reference.
    pub by_mut_ref: bool,
}

impl Param {
    /// A parameter of type `T` taken by value.
    #[must_use]
    pub fn value<T: ?Sized>() -> Self {
        Self {
            type_name: type_name::<T>(),
            exported: true,
            by_mut_ref: false,
        }
    }

    /// A parameter of type `T` taken by mutable reference.
    #[must_use]
    pub fn mut_ref<T: ?Sized>() -> Self {
        Self {
            by_mut_ref: true,
            ..Self::value::<T>()
        }
    }

    /// Marks the parameter type as private to this node.
    #[must_use]
    pub fn unexported(self) -> Self {
        Self {
            exported: false,
            ..self
        }
    }
}

/// The parameter list a procedure declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Parameters in declaration order, receiver excluded.
    pub params: Vec<Param>,
}

impl Signature {
    /// The canonical `(argument, &mut reply)` shape.
    #[must_use]
    pub fn new(argument: Param, reply: Param) -> Self {
        Self {
            params: vec![argument, reply],
        }
    }

    /// The argument parameter, if declared.
    #[must_use]
    pub fn argument(&self) -> Option<&Param> {
        self.params.first()
    }

    /// The reply parameter, if declared.
    #[must_use]
    pub fn reply(&self) -> Option<&Param> {
        self.params.get(1)
    }
}

/// A named, remotely invocable capability.
///
/// Implementations decode the raw argument payload, run against their bound
/// receiver, and return the encoded reply.
pub trait Procedure: Send + Sync {
    /// Name peers use to invoke the procedure.
    fn name(&self) -> &str;

    /// Declared parameter shape, checked once at registration.
    fn signature(&self) -> Signature;

    /// Runs the procedure on an encoded argument, returning the encoded reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the reply cannot be encoded.
    fn invoke(&self, raw_args: &[u8]) -> Result<RawMessage, RpcError>;
}

impl std::fmt::Debug for dyn Procedure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Procedure")
            .field("name", &self.name())
            .field("signature", &self.signature())
            .finish()
    }
}

/// A typed method bound to its receiver: `handler(&receiver, args, &mut reply)`.
pub struct Method<S, A, R, F, C> {
    name: String,
    receiver: Arc<S>,
    handler: F,
    codec: C,
    _types: PhantomData<fn(A) -> R>,
}

impl<S, A, R, F, C> Method<S, A, R, F, C>
where
    F: Fn(&S, A, &mut R),
{
    /// Binds `handler` to `receiver` under `name`.
    pub fn new(name: impl Into<String>, receiver: Arc<S>, handler: F, codec: C) -> Self {
        Self {
            name: name.into(),
            receiver,
            handler,
            codec,
            _types: PhantomData,
        }
    }
}

impl<S, A, R, F, C> Procedure for Method<S, A, R, F, C>
where
    S: Send + Sync,
    A: DeserializeOwned + Default,
    R: Serialize + Default,
    F: Fn(&S, A, &mut R) + Send + Sync,
    C: MessageCodec,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> Signature {
        Signature::new(Param::value::<A>(), Param::mut_ref::<R>())
    }

    fn invoke(&self, raw_args: &[u8]) -> Result<RawMessage, RpcError> {
        // An undecodable argument still invokes the handler, with the default value.
        let args = self.codec.decode::<A>(raw_args).unwrap_or_else(|e| {
            warn!(procedure = %self.name, error = %e, "Failed to decode procedure argument");
            A::default()
        });

        let mut reply = R::default();
        (self.handler)(&self.receiver, args, &mut reply);

        Ok(self.codec.encode(&reply)?.into())
    }
}
