//! Services: receivers that enumerate their procedures.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::procedure::{Method, Procedure};
use crate::wire::MessageCodec;

/// A receiver whose methods are exposed as procedures.
///
/// Registration hands the receiver to [`Service::procedures`], which declares
/// each candidate through [`ServiceMethods`]. Every candidate is validated
/// independently; a malformed one is skipped without affecting the others.
pub trait Service: Send + Sync + Sized + 'static {
    /// Declares the procedures this receiver exposes.
    fn procedures<C: MessageCodec>(methods: &mut ServiceMethods<Self, C>);
}

/// Collects the candidate procedures of one receiver.
pub struct ServiceMethods<S, C> {
    receiver: Arc<S>,
    codec: C,
    candidates: Vec<Arc<dyn Procedure>>,
}

impl<S, C> ServiceMethods<S, C>
where
    S: Send + Sync + 'static,
    C: MessageCodec,
{
    pub(crate) fn new(receiver: Arc<S>, codec: C) -> Self {
        Self {
            receiver,
            codec,
            candidates: Vec::new(),
        }
    }

    /// The receiver every method of this service runs against.
    #[must_use]
    pub fn receiver(&self) -> &Arc<S> {
        &self.receiver
    }

    /// Declares a typed method `handler(&receiver, args, &mut reply)`.
    pub fn method<A, R, F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        A: DeserializeOwned + Default + 'static,
        R: Serialize + Default + 'static,
        F: Fn(&S, A, &mut R) + Send + Sync + 'static,
    {
        let method = Method::new(name, Arc::clone(&self.receiver), handler, self.codec.clone());
        self.candidates.push(Arc::new(method));
        self
    }

    /// Declares a hand-written procedure.
    pub fn procedure(&mut self, procedure: impl Procedure + 'static) -> &mut Self {
        self.candidates.push(Arc::new(procedure));
        self
    }

    pub(crate) fn into_candidates(self) -> Vec<Arc<dyn Procedure>> {
        self.candidates
    }
}
