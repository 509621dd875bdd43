//! Priority-ordered construction of configured components.
//!
//! # Builder chain
//! ```text
//! identifier → registry entry
//!     → ConfigConstruction   ctor(&ClientConfig)        failure: fall through
//!     → DefaultConstruction  ctor() + init_with_config
//!                            + autowire (wiring given)  failure: fatal
//! ```
//!
//! # Design Decisions
//! - The first stage that yields an instance wins; later stages are not run
//! - Only the last stage's failure reaches the caller
//! - Fall-through failures are logged, never surfaced

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::capability::{Capability, CapabilityKind, Component, ComponentBox};
use crate::components::{BeanLookup, BoxError};
use crate::config::ClientConfig;
use crate::error::{ComponentError, ComponentResult};
use crate::instantiate::registry::{ComponentRegistry, ErasedConstructors};
use crate::observability::metrics;

/// Construction path that produced an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildStrategy {
    /// Constructor taking the client configuration.
    ConfigConstruction,
    /// Default constructor followed by the post-construction hooks.
    DefaultConstruction,
}

impl BuildStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildStrategy::ConfigConstruction => "config",
            BuildStrategy::DefaultConstruction => "default",
        }
    }
}

impl fmt::Display for BuildStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a stage needs to build one instance.
struct BuildRequest<'a> {
    config: &'a ClientConfig,
    wiring: Option<&'a dyn BeanLookup>,
}

/// One step of the chain. `Ok(None)` means "not applicable, try the next".
trait BuildStage: Send + Sync {
    fn strategy(&self) -> BuildStrategy;

    fn try_build(
        &self,
        constructors: &ErasedConstructors,
        request: &BuildRequest<'_>,
    ) -> Result<Option<ComponentBox>, BoxError>;
}

struct ConfigConstruction;

impl BuildStage for ConfigConstruction {
    fn strategy(&self) -> BuildStrategy {
        BuildStrategy::ConfigConstruction
    }

    fn try_build(
        &self,
        constructors: &ErasedConstructors,
        request: &BuildRequest<'_>,
    ) -> Result<Option<ComponentBox>, BoxError> {
        constructors
            .with_config
            .as_ref()
            .map(|ctor| ctor(request.config))
            .transpose()
    }
}

struct DefaultConstruction;

impl BuildStage for DefaultConstruction {
    fn strategy(&self) -> BuildStrategy {
        BuildStrategy::DefaultConstruction
    }

    fn try_build(
        &self,
        constructors: &ErasedConstructors,
        request: &BuildRequest<'_>,
    ) -> Result<Option<ComponentBox>, BoxError> {
        let Some(ctor) = &constructors.default else {
            return Ok(None);
        };
        let mut instance = ctor()?;

        if let Some(aware) = instance.as_config_aware() {
            aware.init_with_config(request.config)?;
        }

        if let Some(wiring) = request.wiring {
            if let Some(target) = instance.as_autowire() {
                target.autowire(wiring)?;
            }
        }

        Ok(Some(instance))
    }
}

/// Builds components from registered constructors.
#[derive(Clone)]
pub struct InstantiationEngine {
    registry: Arc<ComponentRegistry>,
    stages: Arc<[Box<dyn BuildStage>]>,
}

impl InstantiationEngine {
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        let stages: Vec<Box<dyn BuildStage>> =
            vec![Box::new(ConfigConstruction), Box::new(DefaultConstruction)];
        Self {
            registry,
            stages: stages.into(),
        }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Build the implementation registered as `identifier` for `kind`.
    ///
    /// `wiring`, when given, receives components that declare `Autowire`
    /// after default construction.
    pub fn instantiate(
        &self,
        kind: CapabilityKind,
        identifier: &str,
        config: &ClientConfig,
        wiring: Option<&dyn BeanLookup>,
    ) -> ComponentResult<Component> {
        let client = config.client_name();
        let Some(constructors) = self.registry.get(kind, identifier) else {
            metrics::record_resolution_error(kind);
            return Err(ComponentError::UnknownIdentifier {
                identifier: identifier.to_string(),
                kind,
                client: client.to_string(),
            });
        };

        let request = BuildRequest { config, wiring };
        let last = self.stages.len() - 1;

        for (position, stage) in self.stages.iter().enumerate() {
            let strategy = stage.strategy();
            match stage.try_build(constructors, &request) {
                Ok(Some(instance)) => {
                    tracing::debug!(
                        client = %client,
                        kind = %kind,
                        identifier = %identifier,
                        strategy = %strategy,
                        component = instance.type_name(),
                        "Component constructed"
                    );
                    metrics::record_component_built(kind, strategy);
                    return Ok(instance.into_component());
                }
                Ok(None) => {
                    tracing::trace!(
                        client = %client,
                        kind = %kind,
                        identifier = %identifier,
                        strategy = %strategy,
                        "Construction strategy not applicable"
                    );
                }
                Err(source) if position < last => {
                    // Best-effort stage: report, then fall back.
                    tracing::warn!(
                        client = %client,
                        kind = %kind,
                        identifier = %identifier,
                        strategy = %strategy,
                        error = %source,
                        "Construction failed, falling back"
                    );
                }
                Err(source) => {
                    metrics::record_resolution_error(kind);
                    return Err(ComponentError::ConstructionFailure {
                        identifier: identifier.to_string(),
                        kind,
                        client: client.to_string(),
                        source,
                    });
                }
            }
        }

        metrics::record_resolution_error(kind);
        Err(ComponentError::ConstructionFailure {
            identifier: identifier.to_string(),
            kind,
            client: client.to_string(),
            source: "no usable constructor registered".into(),
        })
    }

    /// Typed variant of [`instantiate`](Self::instantiate).
    pub fn instantiate_as<C: Capability + ?Sized>(
        &self,
        identifier: &str,
        config: &ClientConfig,
        wiring: Option<&dyn BeanLookup>,
    ) -> ComponentResult<Arc<C>> {
        let component = self.instantiate(C::KIND, identifier, config, wiring)?;
        C::from_component(component).ok_or_else(|| ComponentError::ConstructionFailure {
            identifier: identifier.to_string(),
            kind: C::KIND,
            client: config.client_name().to_string(),
            source: "constructor produced a different capability".into(),
        })
    }
}

impl fmt::Debug for InstantiationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstantiationEngine")
            .field("registry", &self.registry)
            .field("stages", &self.stages.iter().map(|s| s.strategy()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::components::{
        Autowire, ClientConfigAware, Lifecycle, NoOpPing, Ping, Rule, Server, ServerList,
    };
    use crate::instantiate::Constructors;

    type EventLog = Arc<Mutex<Vec<String>>>;

    /// Rule that records every hook invoked on it.
    struct TracedRule {
        events: EventLog,
    }

    impl TracedRule {
        fn record(&self, event: impl Into<String>) {
            self.events.lock().unwrap().push(event.into());
        }
    }

    impl Lifecycle for TracedRule {
        fn as_config_aware(&mut self) -> Option<&mut dyn ClientConfigAware> {
            Some(self)
        }

        fn as_autowire(&mut self) -> Option<&mut dyn Autowire> {
            Some(self)
        }
    }

    impl ClientConfigAware for TracedRule {
        fn init_with_config(&mut self, config: &ClientConfig) -> Result<(), BoxError> {
            self.record(format!("init:{}", config.client_name()));
            Ok(())
        }
    }

    impl Autowire for TracedRule {
        fn autowire(&mut self, beans: &dyn BeanLookup) -> Result<(), BoxError> {
            let has_list = beans.get::<dyn ServerList>()?.is_some();
            self.record(format!("autowire:{}:{}", beans.client_name(), has_list));
            Ok(())
        }
    }

    impl Rule for TracedRule {
        fn choose(&self, _servers: &[Arc<Server>]) -> Option<Arc<Server>> {
            None
        }
    }

    struct NoBeans;

    impl BeanLookup for NoBeans {
        fn client_name(&self) -> &str {
            "svc"
        }

        fn lookup(&self, _kind: CapabilityKind) -> ComponentResult<Option<Component>> {
            Ok(None)
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::builder("svc").build()
    }

    fn engine(registry: ComponentRegistry) -> InstantiationEngine {
        InstantiationEngine::new(Arc::new(registry))
    }

    fn traced_registry(events: &EventLog, with_config: bool) -> ComponentRegistry {
        let mut constructors = Constructors::<dyn Rule>::new();
        if with_config {
            let log = events.clone();
            constructors = constructors.with_config(move |_| {
                log.lock().unwrap().push("config".into());
                Ok(Box::new(TracedRule { events: log.clone() }) as Box<dyn Rule>)
            });
        }
        let log = events.clone();
        constructors = constructors.with_default(move || {
            log.lock().unwrap().push("default".into());
            Ok(Box::new(TracedRule { events: log.clone() }) as Box<dyn Rule>)
        });

        let mut registry = ComponentRegistry::new();
        registry.register::<dyn Rule>("Traced", constructors);
        registry
    }

    #[test]
    fn test_unknown_identifier() {
        let engine = engine(ComponentRegistry::with_defaults());
        let err = engine
            .instantiate(CapabilityKind::Rule, "com.example.DoesNotExist", &config(), None)
            .unwrap_err();
        match err {
            ComponentError::UnknownIdentifier { identifier, kind, client } => {
                assert_eq!(identifier, "com.example.DoesNotExist");
                assert_eq!(kind, CapabilityKind::Rule);
                assert_eq!(client, "svc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_config_constructor_preferred() {
        let events = EventLog::default();
        let component = engine(traced_registry(&events, true))
            .instantiate(CapabilityKind::Rule, "Traced", &config(), Some(&NoBeans as &dyn BeanLookup))
            .unwrap();

        assert_eq!(component.kind(), CapabilityKind::Rule);
        assert!(component.type_name().ends_with("TracedRule"));
        // No post-construction hooks on the preferred path
        assert_eq!(*events.lock().unwrap(), vec!["config"]);
    }

    #[test]
    fn test_post_init_and_autowire_hooks() {
        let events = EventLog::default();
        let engine = engine(traced_registry(&events, false));

        engine
            .instantiate(CapabilityKind::Rule, "Traced", &config(), None)
            .unwrap();
        assert_eq!(*events.lock().unwrap(), vec!["default", "init:svc"]);

        events.lock().unwrap().clear();
        engine
            .instantiate_as::<dyn Rule>("Traced", &config(), Some(&NoBeans as &dyn BeanLookup))
            .unwrap();
        assert_eq!(
            *events.lock().unwrap(),
            vec!["default", "init:svc", "autowire:svc:false"]
        );
    }

    #[test]
    fn test_config_constructor_failure_falls_back() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let mut registry = ComponentRegistry::new();
        registry.register::<dyn Ping>(
            "Flaky",
            Constructors::new()
                .with_config(move |_| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Err("no such constructor".into())
                })
                .with_default(|| Ok(Box::new(NoOpPing) as Box<dyn Ping>)),
        );

        let ping = engine(registry)
            .instantiate_as::<dyn Ping>("Flaky", &config(), None)
            .unwrap();
        assert!(ping.is_alive(&Server::new("h", 1)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_constructor_failure_is_fatal() {
        let mut registry = ComponentRegistry::new();
        registry.register::<dyn Rule>(
            "Broken",
            Constructors::new().with_default(|| Err("exploded".into())),
        );

        let err = engine(registry)
            .instantiate(CapabilityKind::Rule, "Broken", &config(), None)
            .unwrap_err();
        assert!(matches!(err, ComponentError::ConstructionFailure { .. }));
        assert!(err.to_string().contains("exploded"));
    }

    #[test]
    fn test_no_fallback_after_failed_config_constructor() {
        let mut registry = ComponentRegistry::new();
        registry.register::<dyn Rule>(
            "ConfigOnly",
            Constructors::new().with_config(|_| Err("bad config".into())),
        );

        let err = engine(registry)
            .instantiate(CapabilityKind::Rule, "ConfigOnly", &config(), None)
            .unwrap_err();
        assert!(err.to_string().contains("no usable constructor"));
    }
}
