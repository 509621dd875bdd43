//! Client factory: named, lazily created, disposable component contexts.
//!
//! # Responsibilities
//! - Map client names to isolated [`ClientContext`]s
//! - Create each context at most once per generation
//! - Resolve components through configuration, then external beans
//! - Dispose contexts individually or all at once
//!
//! # Design Decisions
//! - Reads of populated slots never take a lock
//! - Looking up an unconfigured kind under an unknown name creates no
//!   context; `client_config` and `initialize` always create one
//! - Name-scoped creation locks are never removed; there is one per name
//!   that has ever had a context
//! - A resolution that races a disposal retries on a fresh context

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;

use crate::capability::{Capability, CapabilityKind, Component};
use crate::components::{LoadBalancer, Ping, Rule, ServerList, ServerListFilter};
use crate::config::ClientConfig;
use crate::context::beans::BeanProvider;
use crate::context::client_context::{ClientContext, Providers, Resolution};
use crate::error::ComponentResult;
use crate::instantiate::{ComponentRegistry, InstantiationEngine};
use crate::observability::metrics;
use crate::properties::{EnvPropertySource, PropertiesResolver, PropertySource};

/// Per-client component factory.
pub struct ClientFactory {
    contexts: DashMap<String, Arc<ClientContext>>,
    creation_locks: DashMap<String, Arc<Mutex<()>>>,
    providers: Providers,
    generations: AtomicU64,
}

impl ClientFactory {
    /// Factory over `source` with the bundled implementations registered.
    pub fn new(source: Arc<dyn PropertySource>) -> Self {
        Self::builder().property_source(source).build()
    }

    pub fn builder() -> ClientFactoryBuilder {
        ClientFactoryBuilder::default()
    }

    /// Component of `kind` for client `name`, built on first use.
    ///
    /// Returns `Ok(None)` when the kind is neither configured for the client
    /// nor supplied by the bean provider.
    pub fn get_component(
        &self,
        name: &str,
        kind: CapabilityKind,
    ) -> ComponentResult<Option<Component>> {
        match self.contexts.get(name) {
            Some(context) => {
                if let Some(component) = context.cached(kind) {
                    return Ok(Some(component));
                }
            }
            None if self.providers.beans.is_none() && !self.is_configured(kind, name) => {
                return Ok(None);
            }
            None => {}
        }

        loop {
            let context = self.context(name);
            match context.resolve(kind, &self.providers)? {
                Resolution::Ready(component) => return Ok(component),
                Resolution::Disposed => {
                    tracing::debug!(
                        client = %name,
                        kind = %kind,
                        generation = context.generation(),
                        "Context disposed during resolution, retrying"
                    );
                }
            }
        }
    }

    /// Typed variant of [`get_component`](Self::get_component).
    pub fn get_instance<C: Capability + ?Sized>(&self, name: &str) -> ComponentResult<Option<Arc<C>>> {
        Ok(self.get_component(name, C::KIND)?.and_then(C::from_component))
    }

    pub fn load_balancer(&self, name: &str) -> ComponentResult<Option<Arc<dyn LoadBalancer>>> {
        self.get_instance::<dyn LoadBalancer>(name)
    }

    pub fn rule(&self, name: &str) -> ComponentResult<Option<Arc<dyn Rule>>> {
        self.get_instance::<dyn Rule>(name)
    }

    pub fn ping(&self, name: &str) -> ComponentResult<Option<Arc<dyn Ping>>> {
        self.get_instance::<dyn Ping>(name)
    }

    pub fn server_list(&self, name: &str) -> ComponentResult<Option<Arc<dyn ServerList>>> {
        self.get_instance::<dyn ServerList>(name)
    }

    pub fn server_list_filter(
        &self,
        name: &str,
    ) -> ComponentResult<Option<Arc<dyn ServerListFilter>>> {
        self.get_instance::<dyn ServerListFilter>(name)
    }

    /// Configuration of client `name`; creates its context if needed.
    pub fn client_config(&self, name: &str) -> Arc<ClientConfig> {
        Arc::clone(self.context(name).config())
    }

    /// True iff a non-blank identifier is configured for `kind` on `name`.
    pub fn is_configured(&self, kind: CapabilityKind, name: &str) -> bool {
        self.providers.resolver.is_set(kind, name)
    }

    /// Create the context of `name` and resolve every kind.
    ///
    /// Stops at the first failing kind.
    pub fn initialize(&self, name: &str) -> ComponentResult<()> {
        self.context(name);
        for kind in CapabilityKind::ALL {
            self.get_component(name, kind)?;
        }
        Ok(())
    }

    /// [`initialize`](Self::initialize) every name, in order.
    pub fn initialize_eager<S: AsRef<str>>(&self, names: &[S]) -> ComponentResult<()> {
        for name in names {
            let name = name.as_ref().trim();
            self.initialize(name)?;
            tracing::info!(client = %name, "Client context eagerly initialized");
        }
        Ok(())
    }

    /// Dispose the context of `name`. Returns false if none existed.
    ///
    /// The next access for `name` builds a new context.
    pub fn dispose_context(&self, name: &str) -> bool {
        let lock = self.creation_lock(name);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.contexts.remove(name) {
            Some((_, context)) => {
                context.dispose();
                true
            }
            None => false,
        }
    }

    /// Dispose every context. Returns how many were disposed.
    pub fn dispose_all(&self) -> usize {
        self.context_names()
            .iter()
            .filter(|name| self.dispose_context(name))
            .count()
    }

    /// Names with a live context, sorted.
    pub fn context_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.contexts.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Generation of the live context of `name`, if any.
    pub fn context_generation(&self, name: &str) -> Option<u64> {
        self.contexts.get(name).map(|ctx| ctx.generation())
    }

    pub fn resolver(&self) -> &PropertiesResolver {
        &self.providers.resolver
    }

    pub fn registry(&self) -> &ComponentRegistry {
        self.providers.engine.registry()
    }

    /// Existing context of `name`, or a new one (double-checked under the
    /// name lock).
    fn context(&self, name: &str) -> Arc<ClientContext> {
        if let Some(context) = self.contexts.get(name) {
            return Arc::clone(context.value());
        }

        let lock = self.creation_lock(name);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(context) = self.contexts.get(name) {
            return Arc::clone(context.value());
        }

        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let config = ClientConfig::new(name, Arc::clone(self.providers.resolver.source()));
        let context = Arc::new(ClientContext::new(name, generation, Arc::new(config)));
        self.contexts.insert(name.to_string(), Arc::clone(&context));

        metrics::record_context_created();
        tracing::info!(client = %name, generation, "Client context created");
        context
    }

    fn creation_lock(&self, name: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.creation_locks.entry(name.to_string()).or_default().value())
    }
}

impl Drop for ClientFactory {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

impl fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientFactory")
            .field("contexts", &self.context_names())
            .field("registry", self.registry())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ClientFactory`].
///
/// Defaults: environment properties, the bundled registry, no bean provider.
#[derive(Default)]
pub struct ClientFactoryBuilder {
    source: Option<Arc<dyn PropertySource>>,
    registry: Option<ComponentRegistry>,
    beans: Option<Arc<dyn BeanProvider>>,
}

impl ClientFactoryBuilder {
    pub fn property_source(mut self, source: Arc<dyn PropertySource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn bean_provider(mut self, beans: Arc<dyn BeanProvider>) -> Self {
        self.beans = Some(beans);
        self
    }

    pub fn build(self) -> ClientFactory {
        let source = self
            .source
            .unwrap_or_else(|| Arc::new(EnvPropertySource));
        let registry = self.registry.unwrap_or_else(ComponentRegistry::with_defaults);

        tracing::debug!(registered = registry.len(), "Client factory built");
        ClientFactory {
            contexts: DashMap::new(),
            creation_locks: DashMap::new(),
            providers: Providers {
                resolver: PropertiesResolver::new(source),
                engine: InstantiationEngine::new(Arc::new(registry)),
                beans: self.beans,
            },
            generations: AtomicU64::new(0),
        }
    }
}
