//! Type-erased component instances.
//!
//! A context stores heterogeneous capability instances in one slot array, so
//! every instance travels as a [`Component`] (shared, immutable) or, while it
//! is still being configured, as a [`ComponentBox`] (owned, mutable).

use std::fmt;
use std::sync::Arc;

use crate::capability::CapabilityKind;
use crate::components::{
    Autowire, BoxError, ClientConfigAware, LoadBalancer, Ping, Rule, ServerList,
    ServerListFilter,
};

/// A shared capability instance.
#[derive(Clone)]
pub enum Component {
    LoadBalancer(Arc<dyn LoadBalancer>),
    HealthCheck(Arc<dyn Ping>),
    Rule(Arc<dyn Rule>),
    ServerListProvider(Arc<dyn ServerList>),
    ServerListFilter(Arc<dyn ServerListFilter>),
}

/// An owned capability instance that has not been shared yet.
pub enum ComponentBox {
    LoadBalancer(Box<dyn LoadBalancer>),
    HealthCheck(Box<dyn Ping>),
    Rule(Box<dyn Rule>),
    ServerListProvider(Box<dyn ServerList>),
    ServerListFilter(Box<dyn ServerListFilter>),
}

/// Links a capability trait object type to its kind and its enum variant.
///
/// Implemented for `dyn LoadBalancer`, `dyn Ping`, `dyn Rule`,
/// `dyn ServerList` and `dyn ServerListFilter`.
pub trait Capability: 'static {
    const KIND: CapabilityKind;

    fn into_component(instance: Arc<Self>) -> Component;

    fn from_component(component: Component) -> Option<Arc<Self>>;

    fn into_box(instance: Box<Self>) -> ComponentBox;
}

macro_rules! impl_capability {
    ($trait_object:ty, $variant:ident) => {
        impl Capability for $trait_object {
            const KIND: CapabilityKind = CapabilityKind::$variant;

            fn into_component(instance: Arc<Self>) -> Component {
                Component::$variant(instance)
            }

            fn from_component(component: Component) -> Option<Arc<Self>> {
                match component {
                    Component::$variant(instance) => Some(instance),
                    _ => None,
                }
            }

            fn into_box(instance: Box<Self>) -> ComponentBox {
                ComponentBox::$variant(instance)
            }
        }
    };
}

impl_capability!(dyn LoadBalancer, LoadBalancer);
impl_capability!(dyn Ping, HealthCheck);
impl_capability!(dyn Rule, Rule);
impl_capability!(dyn ServerList, ServerListProvider);
impl_capability!(dyn ServerListFilter, ServerListFilter);

impl Component {
    /// Wrap a shared instance of capability `C`.
    pub fn new<C: Capability + ?Sized>(instance: Arc<C>) -> Self {
        C::into_component(instance)
    }

    pub fn kind(&self) -> CapabilityKind {
        match self {
            Component::LoadBalancer(_) => CapabilityKind::LoadBalancer,
            Component::HealthCheck(_) => CapabilityKind::HealthCheck,
            Component::Rule(_) => CapabilityKind::Rule,
            Component::ServerListProvider(_) => CapabilityKind::ServerListProvider,
            Component::ServerListFilter(_) => CapabilityKind::ServerListFilter,
        }
    }

    /// Concrete type name of the wrapped instance.
    pub fn type_name(&self) -> &'static str {
        match self {
            Component::LoadBalancer(c) => c.type_name(),
            Component::HealthCheck(c) => c.type_name(),
            Component::Rule(c) => c.type_name(),
            Component::ServerListProvider(c) => c.type_name(),
            Component::ServerListFilter(c) => c.type_name(),
        }
    }

    /// Extract the typed instance, if this component is of capability `C`.
    pub fn downcast<C: Capability + ?Sized>(self) -> Option<Arc<C>> {
        C::from_component(self)
    }

    /// True if both components share the same allocation.
    pub fn ptr_eq(&self, other: &Component) -> bool {
        match (self, other) {
            (Component::LoadBalancer(a), Component::LoadBalancer(b)) => Arc::ptr_eq(a, b),
            (Component::HealthCheck(a), Component::HealthCheck(b)) => Arc::ptr_eq(a, b),
            (Component::Rule(a), Component::Rule(b)) => Arc::ptr_eq(a, b),
            (Component::ServerListProvider(a), Component::ServerListProvider(b)) => {
                Arc::ptr_eq(a, b)
            }
            (Component::ServerListFilter(a), Component::ServerListFilter(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Invoke the instance's release hook.
    pub fn release(&self) -> Result<(), BoxError> {
        match self {
            Component::LoadBalancer(c) => c.release(),
            Component::HealthCheck(c) => c.release(),
            Component::Rule(c) => c.release(),
            Component::ServerListProvider(c) => c.release(),
            Component::ServerListFilter(c) => c.release(),
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("kind", &self.kind())
            .field("type", &self.type_name())
            .finish()
    }
}

impl ComponentBox {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            ComponentBox::LoadBalancer(_) => CapabilityKind::LoadBalancer,
            ComponentBox::HealthCheck(_) => CapabilityKind::HealthCheck,
            ComponentBox::Rule(_) => CapabilityKind::Rule,
            ComponentBox::ServerListProvider(_) => CapabilityKind::ServerListProvider,
            ComponentBox::ServerListFilter(_) => CapabilityKind::ServerListFilter,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ComponentBox::LoadBalancer(c) => c.type_name(),
            ComponentBox::HealthCheck(c) => c.type_name(),
            ComponentBox::Rule(c) => c.type_name(),
            ComponentBox::ServerListProvider(c) => c.type_name(),
            ComponentBox::ServerListFilter(c) => c.type_name(),
        }
    }

    /// Post-construction configuration hook, if the instance declares one.
    pub fn as_config_aware(&mut self) -> Option<&mut dyn ClientConfigAware> {
        match self {
            ComponentBox::LoadBalancer(c) => c.as_config_aware(),
            ComponentBox::HealthCheck(c) => c.as_config_aware(),
            ComponentBox::Rule(c) => c.as_config_aware(),
            ComponentBox::ServerListProvider(c) => c.as_config_aware(),
            ComponentBox::ServerListFilter(c) => c.as_config_aware(),
        }
    }

    /// Dependency injection hook, if the instance declares one.
    pub fn as_autowire(&mut self) -> Option<&mut dyn Autowire> {
        match self {
            ComponentBox::LoadBalancer(c) => c.as_autowire(),
            ComponentBox::HealthCheck(c) => c.as_autowire(),
            ComponentBox::Rule(c) => c.as_autowire(),
            ComponentBox::ServerListProvider(c) => c.as_autowire(),
            ComponentBox::ServerListFilter(c) => c.as_autowire(),
        }
    }

    /// Freeze the instance into a shared component.
    pub fn into_component(self) -> Component {
        match self {
            ComponentBox::LoadBalancer(c) => Component::LoadBalancer(Arc::from(c)),
            ComponentBox::HealthCheck(c) => Component::HealthCheck(Arc::from(c)),
            ComponentBox::Rule(c) => Component::Rule(Arc::from(c)),
            ComponentBox::ServerListProvider(c) => Component::ServerListProvider(Arc::from(c)),
            ComponentBox::ServerListFilter(c) => Component::ServerListFilter(Arc::from(c)),
        }
    }
}
