//! Configured identifier lookup.
//!
//! # Responsibilities
//! - Compose `<client>.ribbon.<PropertyNameForKind>` keys
//! - Report whether an identifier is configured for (kind, client)
//! - Return the configured identifier, trimmed, or `None`

use std::fmt;
use std::sync::Arc;

use crate::capability::{CapabilityKind, NAMESPACE};
use crate::properties::PropertySource;

/// Stateless query over an external property source.
#[derive(Clone)]
pub struct PropertiesResolver {
    source: Arc<dyn PropertySource>,
}

impl PropertiesResolver {
    pub fn new(source: Arc<dyn PropertySource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn PropertySource> {
        &self.source
    }

    /// Property key configuring `kind` for `client_name`.
    pub fn property_key(kind: CapabilityKind, client_name: &str) -> String {
        format!("{}.{}.{}", client_name, NAMESPACE, kind.property_name())
    }

    /// True iff a non-blank identifier is configured.
    pub fn is_set(&self, kind: CapabilityKind, client_name: &str) -> bool {
        self.class_name(kind, client_name).is_some()
    }

    /// The configured identifier, or `None` when unset or blank.
    pub fn class_name(&self, kind: CapabilityKind, client_name: &str) -> Option<String> {
        let key = Self::property_key(kind, client_name);
        let value = self.source.get_property(&key)?;
        let value = value.trim();
        if value.is_empty() {
            tracing::trace!(key = %key, "Blank component property ignored");
            return None;
        }
        Some(value.to_string())
    }
}

impl fmt::Debug for PropertiesResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertiesResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::MapPropertySource;

    fn resolver(entries: &[(&str, &str)]) -> PropertiesResolver {
        let source: MapPropertySource = entries.iter().copied().collect();
        PropertiesResolver::new(Arc::new(source))
    }

    #[test]
    fn test_property_key_format() {
        assert_eq!(
            PropertiesResolver::property_key(CapabilityKind::Rule, "myservice"),
            "myservice.ribbon.NFLoadBalancerRuleClassName"
        );
        assert_eq!(
            PropertiesResolver::property_key(CapabilityKind::ServerListFilter, "My.Service"),
            "My.Service.ribbon.NIWSServerListFilterClassName"
        );
    }

    #[test]
    fn test_class_name() {
        let r = resolver(&[
            ("myservice.ribbon.NFLoadBalancerRuleClassName", " RoundRobinRule "),
            ("myservice.ribbon.NFLoadBalancerPingClassName", "   "),
        ]);

        assert_eq!(
            r.class_name(CapabilityKind::Rule, "myservice").as_deref(),
            Some("RoundRobinRule")
        );
        assert!(r.is_set(CapabilityKind::Rule, "myservice"));
        assert!(!r.is_set(CapabilityKind::HealthCheck, "myservice"));
        assert!(!r.is_set(CapabilityKind::LoadBalancer, "myservice"));
        // Client names are case-sensitive
        assert!(!r.is_set(CapabilityKind::Rule, "MyService"));
    }
}
