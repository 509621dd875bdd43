//! Identifier → constructor table.
//!
//! # Responsibilities
//! - Map (capability kind, identifier) to the constructors of one implementation
//! - Keep aliases (short name and fully-qualified name) pointing at one entry
//! - Erase the capability type so one table serves every kind

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::capability::{Capability, CapabilityKind, ComponentBox};
use crate::components::{
    BaseLoadBalancer, BestAvailableRule, BoxError, ConfigurationBasedServerList, LoadBalancer,
    NoOpPing, PassThroughServerListFilter, Ping, RandomRule, RoundRobinRule, Rule, ServerList,
    ServerListFilter, ServerListSubsetFilter,
};
use crate::config::ClientConfig;

type ConfigCtor<C> = Box<dyn Fn(&ClientConfig) -> Result<Box<C>, BoxError> + Send + Sync>;
type DefaultCtor<C> = Box<dyn Fn() -> Result<Box<C>, BoxError> + Send + Sync>;

pub(crate) type ErasedConfigCtor =
    Box<dyn Fn(&ClientConfig) -> Result<ComponentBox, BoxError> + Send + Sync>;
pub(crate) type ErasedDefaultCtor = Box<dyn Fn() -> Result<ComponentBox, BoxError> + Send + Sync>;

const NETFLIX_PACKAGE: &str = "com.netflix.loadbalancer";

/// Constructors of one implementation of capability `C`.
///
/// `with_config` is the preferred, best-effort path; `with_default` is the
/// fallback whose instance then receives the post-construction hooks.
pub struct Constructors<C: ?Sized> {
    with_config: Option<ConfigCtor<C>>,
    default: Option<DefaultCtor<C>>,
}

impl<C: Capability + ?Sized> Constructors<C> {
    pub fn new() -> Self {
        Self {
            with_config: None,
            default: None,
        }
    }

    /// Constructor taking the client configuration.
    pub fn with_config<F>(mut self, ctor: F) -> Self
    where
        F: Fn(&ClientConfig) -> Result<Box<C>, BoxError> + Send + Sync + 'static,
    {
        self.with_config = Some(Box::new(ctor));
        self
    }

    /// Constructor without arguments.
    pub fn with_default<F>(mut self, ctor: F) -> Self
    where
        F: Fn() -> Result<Box<C>, BoxError> + Send + Sync + 'static,
    {
        self.default = Some(Box::new(ctor));
        self
    }

    fn erase(self) -> ErasedConstructors {
        ErasedConstructors {
            with_config: self.with_config.map(|ctor| {
                Box::new(move |config: &ClientConfig| ctor(config).map(C::into_box))
                    as ErasedConfigCtor
            }),
            default: self
                .default
                .map(|ctor| Box::new(move || ctor().map(C::into_box)) as ErasedDefaultCtor),
        }
    }
}

impl<C: Capability + ?Sized> Default for Constructors<C> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct ErasedConstructors {
    pub(crate) with_config: Option<ErasedConfigCtor>,
    pub(crate) default: Option<ErasedDefaultCtor>,
}

/// Process-wide table of constructible implementations, populated at startup.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    entries: HashMap<(CapabilityKind, String), Arc<ErasedConstructors>>,
}

impl ComponentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the bundled implementations under their short and
    /// `com.netflix.loadbalancer.*` names.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register_builtin::<dyn LoadBalancer>(
            &["BaseLoadBalancer"],
            Constructors::new()
                .with_default(|| Ok(Box::new(BaseLoadBalancer::new()) as Box<dyn LoadBalancer>)),
        );

        registry.register_builtin::<dyn Ping>(
            &["NoOpPing", "DummyPing"],
            Constructors::new().with_default(|| Ok(Box::new(NoOpPing) as Box<dyn Ping>)),
        );

        registry.register_builtin::<dyn Rule>(
            &["RoundRobinRule"],
            Constructors::new().with_default(|| Ok(Box::new(RoundRobinRule::new()) as Box<dyn Rule>)),
        );
        registry.register_builtin::<dyn Rule>(
            &["RandomRule"],
            Constructors::new().with_default(|| Ok(Box::new(RandomRule::new()) as Box<dyn Rule>)),
        );
        registry.register_builtin::<dyn Rule>(
            &["BestAvailableRule"],
            Constructors::new()
                .with_default(|| Ok(Box::new(BestAvailableRule::new()) as Box<dyn Rule>)),
        );

        registry.register_builtin::<dyn ServerList>(
            &["ConfigurationBasedServerList"],
            Constructors::new().with_default(|| {
                Ok(Box::new(ConfigurationBasedServerList::new()) as Box<dyn ServerList>)
            }),
        );

        // No com.netflix.loadbalancer counterpart, so no qualified alias
        registry.register::<dyn ServerListFilter>(
            "PassThroughServerListFilter",
            Constructors::new().with_default(|| {
                Ok(Box::new(PassThroughServerListFilter) as Box<dyn ServerListFilter>)
            }),
        );
        registry.register_builtin::<dyn ServerListFilter>(
            &["ServerListSubsetFilter"],
            Constructors::new().with_config(|config| {
                Ok(Box::new(ServerListSubsetFilter::with_config(config)) as Box<dyn ServerListFilter>)
            }),
        );

        registry
    }

    /// Register (or replace) the implementation named `identifier` for capability `C`.
    pub fn register<C: Capability + ?Sized>(
        &mut self,
        identifier: impl Into<String>,
        constructors: Constructors<C>,
    ) -> &mut Self {
        let identifier = identifier.into();
        tracing::trace!(kind = %C::KIND, identifier = %identifier, "Component registered");
        self.entries
            .insert((C::KIND, identifier), Arc::new(constructors.erase()));
        self
    }

    /// Make `alias` resolve to the same constructors as `target`.
    ///
    /// Returns false if `target` is not registered for `kind`.
    pub fn alias(&mut self, kind: CapabilityKind, alias: impl Into<String>, target: &str) -> bool {
        let Some(entry) = self.entries.get(&(kind, target.to_string())).cloned() else {
            return false;
        };
        self.entries.insert((kind, alias.into()), entry);
        true
    }

    pub fn contains(&self, kind: CapabilityKind, identifier: &str) -> bool {
        self.entries.contains_key(&(kind, identifier.to_string()))
    }

    /// Registered identifiers for `kind`, sorted.
    pub fn identifiers(&self, kind: CapabilityKind) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .entries
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, id)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn get(
        &self,
        kind: CapabilityKind,
        identifier: &str,
    ) -> Option<&Arc<ErasedConstructors>> {
        self.entries.get(&(kind, identifier.to_string()))
    }

    /// Register under every short name plus its fully-qualified alias.
    fn register_builtin<C: Capability + ?Sized>(
        &mut self,
        names: &[&str],
        constructors: Constructors<C>,
    ) {
        let Some((primary, rest)) = names.split_first() else {
            return;
        };
        self.register(*primary, constructors);
        for name in rest {
            self.alias(C::KIND, *name, primary);
        }
        for name in names {
            self.alias(C::KIND, format!("{}.{}", NETFLIX_PACKAGE, name), primary);
        }
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("ComponentRegistry")
            .field("entries", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_kind() {
        let registry = ComponentRegistry::with_defaults();
        for kind in CapabilityKind::ALL {
            assert!(!registry.identifiers(kind).is_empty(), "no default for {}", kind);
        }
        assert!(registry.contains(CapabilityKind::Rule, "RoundRobinRule"));
        assert!(registry.contains(CapabilityKind::Rule, "com.netflix.loadbalancer.RoundRobinRule"));
        assert!(registry.contains(CapabilityKind::HealthCheck, "com.netflix.loadbalancer.DummyPing"));
        // Identifiers are scoped by kind
        assert!(!registry.contains(CapabilityKind::HealthCheck, "RoundRobinRule"));
    }

    #[test]
    fn test_pass_through_filter_has_short_name_only() {
        let registry = ComponentRegistry::with_defaults();
        assert_eq!(
            registry.identifiers(CapabilityKind::ServerListFilter),
            vec![
                "PassThroughServerListFilter",
                "ServerListSubsetFilter",
                "com.netflix.loadbalancer.ServerListSubsetFilter",
            ]
        );
    }

    #[test]
    fn test_alias() {
        let mut registry = ComponentRegistry::new();
        registry.register::<dyn Rule>(
            "RoundRobinRule",
            Constructors::new().with_default(|| Ok(Box::new(RoundRobinRule::new()) as Box<dyn Rule>)),
        );
        assert!(registry.alias(CapabilityKind::Rule, "rr", "RoundRobinRule"));
        assert!(!registry.alias(CapabilityKind::Rule, "x", "Missing"));
        assert_eq!(registry.identifiers(CapabilityKind::Rule), vec!["RoundRobinRule", "rr"]);
        assert_eq!(registry.len(), 2);
    }
}
