//! One client's isolated set of component instances.
//!
//! # Responsibilities
//! - Hold at most one instance per capability kind
//! - Build each instance at most once, even under concurrent first access
//! - Hand sibling instances to components being wired
//! - Release every owned instance exactly once on disposal
//!
//! # Locking
//! ```text
//! state: RwLock<ContextState>   read  = resolution in progress
//!                               write = disposal (waits for resolutions)
//! building: Mutex<()>           one build at a time per context
//! slot.instance: ArcSwapOption  lock-free reads once populated
//! ```
//!
//! Lock order is always state → building. Only the outermost resolution on a
//! thread takes `building`; siblings resolved during wiring run under it
//! without further locking. A kind already on the current resolution path
//! resolves to `None`.

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use arc_swap::ArcSwapOption;

use crate::capability::{CapabilityKind, Component};
use crate::components::BeanLookup;
use crate::config::ClientConfig;
use crate::context::beans::BeanProvider;
use crate::error::ComponentResult;
use crate::instantiate::InstantiationEngine;
use crate::observability::metrics;
use crate::properties::PropertiesResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextState {
    Active,
    Disposed,
}

/// Outcome of a resolution attempt against one context.
pub(crate) enum Resolution {
    /// Resolved; `None` when the kind is neither configured nor provided.
    Ready(Option<Component>),
    /// The context was disposed first; retry on a fresh one.
    Disposed,
}

/// Collaborators a context resolves through, owned by the factory.
pub(crate) struct Providers {
    pub(crate) resolver: PropertiesResolver,
    pub(crate) engine: InstantiationEngine,
    pub(crate) beans: Option<Arc<dyn BeanProvider>>,
}

struct SlotEntry {
    component: Component,
    /// False for provider beans, which the context must not release.
    owned: bool,
}

#[derive(Default)]
struct Slot {
    instance: ArcSwapOption<SlotEntry>,
}

impl Slot {
    fn load(&self) -> Option<Component> {
        self.instance
            .load_full()
            .map(|entry| entry.component.clone())
    }
}

/// Kinds currently being built on this thread's resolution path.
#[derive(Default)]
struct ResolutionPath(RefCell<Vec<CapabilityKind>>);

impl ResolutionPath {
    fn contains(&self, kind: CapabilityKind) -> bool {
        self.0.borrow().contains(&kind)
    }

    fn push(&self, kind: CapabilityKind) {
        self.0.borrow_mut().push(kind);
    }

    fn pop(&self) {
        self.0.borrow_mut().pop();
    }
}

/// Isolated container of the components built for one client name.
pub struct ClientContext {
    name: String,
    generation: u64,
    config: Arc<ClientConfig>,
    slots: [Slot; CapabilityKind::COUNT],
    state: RwLock<ContextState>,
    building: Mutex<()>,
}

impl ClientContext {
    pub(crate) fn new(name: impl Into<String>, generation: u64, config: Arc<ClientConfig>) -> Self {
        Self {
            name: name.into(),
            generation,
            config,
            slots: std::array::from_fn(|_| Slot::default()),
            state: RwLock::new(ContextState::Active),
            building: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Monotonic number distinguishing successive contexts of the same name.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &Arc<ClientConfig> {
        &self.config
    }

    pub fn is_disposed(&self) -> bool {
        *self.state.read().unwrap_or_else(PoisonError::into_inner) == ContextState::Disposed
    }

    /// The instance held for `kind`, without building anything.
    pub fn cached(&self, kind: CapabilityKind) -> Option<Component> {
        self.slots[kind.index()].load()
    }

    /// Kinds currently holding an instance.
    pub fn populated_kinds(&self) -> Vec<CapabilityKind> {
        CapabilityKind::ALL
            .into_iter()
            .filter(|kind| self.slots[kind.index()].instance.load().is_some())
            .collect()
    }

    pub(crate) fn resolve(
        &self,
        kind: CapabilityKind,
        providers: &Providers,
    ) -> ComponentResult<Resolution> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if *state == ContextState::Disposed {
            return Ok(Resolution::Disposed);
        }
        if let Some(component) = self.cached(kind) {
            return Ok(Resolution::Ready(Some(component)));
        }

        let building = self.building.lock().unwrap_or_else(PoisonError::into_inner);
        let path = ResolutionPath::default();
        let component = self.resolve_locked(kind, providers, &path)?;
        drop(building);
        drop(state);
        Ok(Resolution::Ready(component))
    }

    /// Resolve with the lifecycle read lock and the building lock already held
    /// by the outermost caller.
    fn resolve_locked(
        &self,
        kind: CapabilityKind,
        providers: &Providers,
        path: &ResolutionPath,
    ) -> ComponentResult<Option<Component>> {
        let slot = &self.slots[kind.index()];
        if let Some(component) = slot.load() {
            return Ok(Some(component));
        }

        if path.contains(kind) {
            tracing::warn!(
                client = %self.name,
                kind = %kind,
                "Dependency cycle while wiring, leaving dependency unset"
            );
            return Ok(None);
        }

        path.push(kind);
        let built = self.build(kind, providers, path);
        path.pop();

        let Some(entry) = built? else {
            return Ok(None);
        };
        let component = entry.component.clone();
        slot.instance.store(Some(Arc::new(entry)));
        Ok(Some(component))
    }

    fn build(
        &self,
        kind: CapabilityKind,
        providers: &Providers,
        path: &ResolutionPath,
    ) -> ComponentResult<Option<SlotEntry>> {
        if let Some(identifier) = providers.resolver.class_name(kind, &self.name) {
            let wiring: &dyn BeanLookup = &ContextBeans {
                context: self,
                providers,
                path,
            };
            let component =
                providers
                    .engine
                    .instantiate(kind, &identifier, &self.config, Some(wiring))?;
            return Ok(Some(SlotEntry {
                component,
                owned: true,
            }));
        }

        Ok(self.external_bean(kind, providers).map(|component| SlotEntry {
            component,
            owned: false,
        }))
    }

    fn external_bean(&self, kind: CapabilityKind, providers: &Providers) -> Option<Component> {
        let bean = providers.beans.as_ref()?.get_bean(&self.name, kind)?;
        if bean.kind() != kind {
            tracing::warn!(
                client = %self.name,
                kind = %kind,
                provided = %bean.kind(),
                "Bean provider returned a component of the wrong kind, ignoring it"
            );
            return None;
        }
        tracing::debug!(
            client = %self.name,
            kind = %kind,
            component = bean.type_name(),
            "Using externally provided component"
        );
        Some(bean)
    }

    /// Mark disposed, empty every slot and release the owned instances.
    ///
    /// Waits for in-flight resolutions. Idempotent.
    pub(crate) fn dispose(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *state == ContextState::Disposed {
            return;
        }
        *state = ContextState::Disposed;

        let mut released = 0;
        for kind in CapabilityKind::ALL {
            let Some(entry) = self.slots[kind.index()].instance.swap(None) else {
                continue;
            };
            if !entry.owned {
                continue;
            }
            released += 1;
            if let Err(error) = entry.component.release() {
                metrics::record_release_failure(kind);
                tracing::warn!(
                    client = %self.name,
                    kind = %kind,
                    component = entry.component.type_name(),
                    error = %error,
                    "Failed to release component"
                );
            }
        }

        metrics::record_context_disposed();
        tracing::info!(
            client = %self.name,
            generation = self.generation,
            released,
            "Client context disposed"
        );
    }
}

impl Drop for ClientContext {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("name", &self.name)
            .field("generation", &self.generation)
            .field("populated", &self.populated_kinds())
            .finish()
    }
}

/// Sibling lookup handed to components wired inside a context.
struct ContextBeans<'a> {
    context: &'a ClientContext,
    providers: &'a Providers,
    path: &'a ResolutionPath,
}

impl BeanLookup for ContextBeans<'_> {
    fn client_name(&self) -> &str {
        &self.context.name
    }

    fn lookup(&self, kind: CapabilityKind) -> ComponentResult<Option<Component>> {
        self.context.resolve_locked(kind, self.providers, self.path)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::components::{BoxError, Lifecycle, Ping, Server};
    use crate::instantiate::{ComponentRegistry, Constructors};
    use crate::properties::MapPropertySource;

    struct CountingPing {
        released: Arc<AtomicUsize>,
    }

    impl Lifecycle for CountingPing {
        fn release(&self) -> Result<(), BoxError> {
            self.released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl Ping for CountingPing {
        fn is_alive(&self, _server: &Server) -> bool {
            true
        }
    }

    fn providers(properties: MapPropertySource, registry: ComponentRegistry) -> Providers {
        Providers {
            resolver: PropertiesResolver::new(Arc::new(properties)),
            engine: InstantiationEngine::new(Arc::new(registry)),
            beans: None,
        }
    }

    fn context(name: &str) -> ClientContext {
        ClientContext::new(name, 1, Arc::new(ClientConfig::builder(name).build()))
    }

    fn ready(resolution: Resolution) -> Option<Component> {
        match resolution {
            Resolution::Ready(component) => component,
            Resolution::Disposed => panic!("context unexpectedly disposed"),
        }
    }

    #[test]
    fn test_instance_is_cached() {
        let providers = providers(
            MapPropertySource::default().with("svc.ribbon.NFLoadBalancerRuleClassName", "RoundRobinRule"),
            ComponentRegistry::with_defaults(),
        );
        let ctx = context("svc");

        let first = ready(ctx.resolve(CapabilityKind::Rule, &providers).unwrap()).unwrap();
        let second = ready(ctx.resolve(CapabilityKind::Rule, &providers).unwrap()).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(ctx.populated_kinds(), vec![CapabilityKind::Rule]);
    }

    #[test]
    fn test_unconfigured_is_not_cached() {
        let providers = providers(MapPropertySource::default(), ComponentRegistry::with_defaults());
        let ctx = context("svc");

        assert!(ready(ctx.resolve(CapabilityKind::Rule, &providers).unwrap()).is_none());
        assert!(ctx.cached(CapabilityKind::Rule).is_none());
        assert!(ctx.populated_kinds().is_empty());
    }

    #[test]
    fn test_dispose_releases_once_and_refuses_resolution() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let mut registry = ComponentRegistry::new();
        registry.register::<dyn Ping>(
            "Counting",
            Constructors::new().with_default(move || {
                Ok(Box::new(CountingPing {
                    released: counter.clone(),
                }) as Box<dyn Ping>)
            }),
        );
        let providers = providers(
            MapPropertySource::default().with("svc.ribbon.NFLoadBalancerPingClassName", "Counting"),
            registry,
        );
        let ctx = context("svc");
        assert!(ready(ctx.resolve(CapabilityKind::HealthCheck, &providers).unwrap()).is_some());

        ctx.dispose();
        ctx.dispose();
        assert!(ctx.is_disposed());
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(ctx.cached(CapabilityKind::HealthCheck).is_none());
        assert!(matches!(
            ctx.resolve(CapabilityKind::HealthCheck, &providers).unwrap(),
            Resolution::Disposed
        ));

        drop(ctx);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let mut registry = ComponentRegistry::new();
        registry.register::<dyn Ping>(
            "Counting",
            Constructors::new().with_default(move || {
                Ok(Box::new(CountingPing {
                    released: counter.clone(),
                }) as Box<dyn Ping>)
            }),
        );
        let providers = providers(
            MapPropertySource::default().with("svc.ribbon.NFLoadBalancerPingClassName", "Counting"),
            registry,
        );

        let ctx = context("svc");
        ready(ctx.resolve(CapabilityKind::HealthCheck, &providers).unwrap());
        drop(ctx);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
