//! Procedure registry for a node.
//!
//! Maps procedure names to type-erased [`Procedure`] handlers. Candidates are
//! validated once, when registered: a procedure takes exactly an argument by
//! value and a reply by mutable reference, and both types must be exported.
//! Lookups on the dispatch path clone the handler out and invoke it without
//! holding the registry lock.

pub mod procedure;
pub mod service;

pub use procedure::{Method, Param, Procedure, Signature};
pub use service::{Service, ServiceMethods};

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::RegistrationError;
use crate::wire::MessageCodec;

/// Outcome of registering a [`Service`].
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Names of the procedures that were registered.
    pub registered: Vec<String>,
    /// Candidates that were skipped, with the reason.
    pub rejected: Vec<RegistrationError>,
}

impl RegistrationReport {
    /// Returns `true` if every candidate was registered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Registry of procedures keyed by name.
#[derive(Default)]
pub struct ProcedureRegistry {
    procedures: RwLock<HashMap<String, Arc<dyn Procedure>>>,
}

impl std::fmt::Debug for ProcedureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcedureRegistry")
            .field("procedures", &self.names())
            .finish()
    }
}

impl ProcedureRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every procedure `receiver` declares.
    ///
    /// Malformed candidates are logged and skipped; the rest are registered.
    pub fn register_service<S, C>(&self, receiver: S, codec: C) -> RegistrationReport
    where
        S: Service,
        C: MessageCodec,
    {
        let mut methods = ServiceMethods::new(Arc::new(receiver), codec);
        S::procedures(&mut methods);

        let mut report = RegistrationReport::default();
        for candidate in methods.into_candidates() {
            match self.insert(candidate) {
                Ok(name) => report.registered.push(name),
                Err(e) => {
                    warn!(service = std::any::type_name::<S>(), error = %e, "Skipping procedure");
                    report.rejected.push(e);
                }
            }
        }

        info!(
            service = std::any::type_name::<S>(),
            registered = report.registered.len(),
            rejected = report.rejected.len(),
            "Registered service"
        );
        report
    }

    /// Registers a single procedure.
    ///
    /// # Errors
    ///
    /// Returns a `RegistrationError` if the procedure's shape is invalid.
    pub fn register(&self, procedure: impl Procedure + 'static) -> Result<(), RegistrationError> {
        self.insert(Arc::new(procedure)).map(|_| ())
    }

    /// Looks up a procedure by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Procedure>> {
        self.procedures.read().get(name).cloned()
    }

    /// Returns `true` if a procedure is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.procedures.read().contains_key(name)
    }

    /// Lists the registered procedure names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.procedures.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn insert(&self, procedure: Arc<dyn Procedure>) -> Result<String, RegistrationError> {
        validate(procedure.as_ref())?;

        let name = procedure.name().to_string();
        let replaced = self.procedures.write().insert(name.clone(), procedure);
        if replaced.is_some() {
            debug!(procedure = %name, "Replaced existing procedure");
        }
        Ok(name)
    }
}

/// Checks that a procedure takes `(argument, &mut reply)` with exported types.
///
/// # Errors
///
/// Returns the first shape violation found.
pub fn validate(procedure: &dyn Procedure) -> Result<(), RegistrationError> {
    let name = procedure.name();
    if name.trim().is_empty() {
        return Err(RegistrationError::EmptyName);
    }

    let signature = procedure.signature();
    let [argument, reply] = signature.params.as_slice() else {
        return Err(RegistrationError::WrongArity {
            procedure: name.to_string(),
            found: signature.params.len(),
        });
    };

    if !argument.exported {
        return Err(RegistrationError::ArgumentNotExported {
            procedure: name.to_string(),
            type_name: argument.type_name,
        });
    }
    if !reply.by_mut_ref {
        return Err(RegistrationError::ReplyNotMutable {
            procedure: name.to_string(),
            type_name: reply.type_name,
        });
    }
    if !reply.exported {
        return Err(RegistrationError::ReplyNotExported {
            procedure: name.to_string(),
            type_name: reply.type_name,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RpcError;
    use crate::wire::{JsonCodec, RawMessage};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Text {
        #[serde(rename = "Text")]
        text: String,
    }

    struct Echo;

    impl Service for Echo {
        fn procedures<C: MessageCodec>(methods: &mut ServiceMethods<Self, C>) {
            methods.method("Echo", |_: &Echo, args: Text, reply: &mut Text| {
                reply.text = args.text;
            });
        }
    }

    struct Shaped {
        name: &'static str,
        signature: Signature,
    }

    impl Procedure for Shaped {
        fn name(&self) -> &str {
            self.name
        }

        fn signature(&self) -> Signature {
            self.signature.clone()
        }

        fn invoke(&self, _raw_args: &[u8]) -> Result<RawMessage, RpcError> {
            Ok(RawMessage::from_static(b"null"))
        }
    }

    fn shaped(params: Vec<Param>) -> Shaped {
        Shaped {
            name: "Shaped",
            signature: Signature { params },
        }
    }

    #[test]
    fn test_register_service() {
        let registry = ProcedureRegistry::new();
        let report = registry.register_service(Echo, JsonCodec);

        assert!(report.is_complete());
        assert_eq!(report.registered, vec!["Echo".to_string()]);
        assert!(registry.contains("Echo"));
        assert_eq!(registry.get("Echo").unwrap().name(), "Echo");
    }

    #[test]
    fn test_rejects_three_params() {
        let registry = ProcedureRegistry::new();
        let result = registry.register(shaped(vec![
            Param::value::<u32>(),
            Param::value::<u32>(),
            Param::mut_ref::<u32>(),
        ]));

        assert!(matches!(
            result,
            Err(RegistrationError::WrongArity { found: 3, .. })
        ));
        assert!(!registry.contains("Shaped"));
    }

    #[test]
    fn test_rejects_five_params() {
        let params = vec![Param::value::<u8>(); 4]
            .into_iter()
            .chain(std::iter::once(Param::mut_ref::<u8>()))
            .collect();

        let result = validate(&shaped(params));
        assert!(matches!(
            result,
            Err(RegistrationError::WrongArity { found: 5, .. })
        ));
    }

    #[test]
    fn test_rejects_unexported_argument() {
        let result = validate(&shaped(vec![
            Param::value::<String>().unexported(),
            Param::mut_ref::<String>(),
        ]));

        assert!(matches!(
            result,
            Err(RegistrationError::ArgumentNotExported { .. })
        ));
    }

    struct Mixed;

    impl Service for Mixed {
        fn procedures<C: MessageCodec>(methods: &mut ServiceMethods<Self, C>) {
            methods
                .method("Length", |_: &Mixed, args: Text, reply: &mut usize| {
                    *reply = args.text.len();
                })
                .procedure(shaped(vec![Param::value::<u8>()]));
        }
    }

    #[test]
    fn test_service_skips_only_malformed_candidates() {
        let registry = ProcedureRegistry::new();
        let report = registry.register_service(Mixed, JsonCodec);

        assert!(!report.is_complete());
        assert_eq!(report.registered, vec!["Length".to_string()]);
        assert_eq!(report.rejected.len(), 1);
        assert!(registry.contains("Length"));
        assert!(!registry.contains("Shaped"));
    }

    #[test]
    fn test_rejects_reply_by_value() {
        let registry = ProcedureRegistry::new();
        let result = registry.register(shaped(vec![
            Param::value::<String>(),
            Param::value::<String>(),
        ]));

        assert!(matches!(
            result,
            Err(RegistrationError::ReplyNotMutable { .. })
        ));
    }

    #[test]
    fn test_rejects_unexported_reply() {
        let registry = ProcedureRegistry::new();
        let result = registry.register(shaped(vec![
            Param::value::<String>(),
            Param::mut_ref::<String>().unexported(),
        ]));

        assert!(matches!(
            result,
            Err(RegistrationError::ReplyNotExported { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_name() {
        let registry = ProcedureRegistry::new();
        let mut procedure = shaped(vec![Param::value::<u8>(), Param::mut_ref::<u8>()]);
        procedure.name = "  ";

        assert_eq!(registry.register(procedure), Err(RegistrationError::EmptyName));
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = ProcedureRegistry::new();
        registry
            .register(shaped(vec![Param::value::<u8>(), Param::mut_ref::<u8>()]))
            .unwrap();
        registry
            .register(shaped(vec![Param::value::<u16>(), Param::mut_ref::<u16>()]))
            .unwrap();

        let procedure = registry.get("Shaped").unwrap();
        assert_eq!(procedure.signature().argument().unwrap().type_name, "u16");
        assert_eq!(registry.names(), vec!["Shaped".to_string()]);
    }
}
