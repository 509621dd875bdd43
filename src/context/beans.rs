//! Externally supplied component instances.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::capability::{Capability, CapabilityKind, Component};

/// Source of ready-made instances for clients that do not configure a kind.
///
/// Instances handed out here are owned by the provider: contexts cache them
/// but never call their release hook.
pub trait BeanProvider: Send + Sync {
    fn get_bean(&self, client_name: &str, kind: CapabilityKind) -> Option<Component>;
}

/// Fixed set of instances, registered per client or for every client.
#[derive(Default)]
pub struct StaticBeanProvider {
    per_client: HashMap<(String, CapabilityKind), Component>,
    shared: HashMap<CapabilityKind, Component>,
}

impl StaticBeanProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide `instance` to `client_name` only.
    pub fn with_client_bean<C: Capability + ?Sized>(
        mut self,
        client_name: impl Into<String>,
        instance: Arc<C>,
    ) -> Self {
        self.per_client
            .insert((client_name.into(), C::KIND), Component::new(instance));
        self
    }

    /// Provide `instance` to every client without a client-specific bean.
    pub fn with_shared_bean<C: Capability + ?Sized>(mut self, instance: Arc<C>) -> Self {
        self.shared.insert(C::KIND, Component::new(instance));
        self
    }
}

impl BeanProvider for StaticBeanProvider {
    fn get_bean(&self, client_name: &str, kind: CapabilityKind) -> Option<Component> {
        self.per_client
            .get(&(client_name.to_string(), kind))
            .or_else(|| self.shared.get(&kind))
            .cloned()
    }
}

impl fmt::Debug for StaticBeanProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticBeanProvider")
            .field("per_client", &self.per_client.len())
            .field("shared", &self.shared.len())
            .finish()
    }
}
