//! Applying reloaded configuration to a running factory.

use crate::config::validation::validate_identifiers;
use crate::config::{ConfigError, FactoryConfig};
use crate::lifecycle::startup::Runtime;
use crate::properties::{diff_properties, PropertyChanges};

impl Runtime {
    /// Swap in the properties of `config` and dispose affected contexts.
    ///
    /// Contexts of changed clients are rebuilt lazily on next access. A
    /// change to a global `ribbon.*` key disposes every context.
    pub fn reload(&self, config: &FactoryConfig) -> Result<PropertyChanges, ConfigError> {
        validate_identifiers(config, self.factory.registry()).map_err(ConfigError::Validation)?;

        let previous = self.properties.replace(config.flattened_properties());
        let changes = diff_properties(&previous, &self.properties.snapshot());

        if changes.is_empty() {
            tracing::debug!("Configuration reloaded, no client affected");
            return Ok(changes);
        }

        let disposed = if changes.global {
            self.factory.dispose_all()
        } else {
            changes
                .clients
                .iter()
                .filter(|client| self.factory.dispose_context(client))
                .count()
        };

        tracing::info!(
            clients = ?changes.clients,
            global = changes.global,
            disposed,
            "Configuration reloaded"
        );
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::capability::CapabilityKind;
    use crate::components::Lifecycle;
    use crate::config::loader::parse_config;
    use crate::instantiate::ComponentRegistry;
    use crate::lifecycle::start;

    const INITIAL: &str = r#"
        [properties.reload-a.ribbon]
        NFLoadBalancerRuleClassName = "RoundRobinRule"

        [properties.reload-b.ribbon]
        NFLoadBalancerRuleClassName = "RandomRule"
    "#;

    #[test]
    fn test_only_changed_clients_are_disposed() {
        let runtime = start(&parse_config(INITIAL).unwrap(), ComponentRegistry::with_defaults()).unwrap();
        let factory = runtime.factory();
        let a = factory.rule("reload-a").unwrap().unwrap();
        let b = factory.rule("reload-b").unwrap().unwrap();

        let updated = parse_config(
            r#"
            [properties.reload-a.ribbon]
            NFLoadBalancerRuleClassName = "BestAvailableRule"

            [properties.reload-b.ribbon]
            NFLoadBalancerRuleClassName = "RandomRule"
            "#,
        )
        .unwrap();
        let changes = runtime.reload(&updated).unwrap();
        assert_eq!(changes.clients.iter().collect::<Vec<_>>(), vec!["reload-a"]);

        let a2 = factory.rule("reload-a").unwrap().unwrap();
        let b2 = factory.rule("reload-b").unwrap().unwrap();
        assert!(!Arc::ptr_eq(&a, &a2));
        assert!(Arc::ptr_eq(&b, &b2));
        assert!(a2.type_name().ends_with("BestAvailableRule"));
    }

    #[test]
    fn test_global_change_disposes_everything() {
        let runtime = start(&parse_config(INITIAL).unwrap(), ComponentRegistry::with_defaults()).unwrap();
        let factory = runtime.factory();
        factory.get_component("reload-a", CapabilityKind::Rule).unwrap();
        factory.get_component("reload-b", CapabilityKind::Rule).unwrap();

        let mut updated = INITIAL.to_string();
        updated.push_str("\n[properties.ribbon]\nlistOfServers = \"h:1\"\n");
        let changes = runtime.reload(&parse_config(&updated).unwrap()).unwrap();
        assert!(changes.global);
        assert!(factory.context_names().is_empty());
    }

    #[test]
    fn test_rejected_reload_keeps_properties() {
        let runtime = start(&parse_config(INITIAL).unwrap(), ComponentRegistry::with_defaults()).unwrap();
        let bad = parse_config(
            r#"
            [properties.reload-a.ribbon]
            NFLoadBalancerRuleClassName = "NoSuchRule"
            "#,
        )
        .unwrap();

        assert!(runtime.reload(&bad).is_err());
        assert_eq!(
            runtime
                .properties()
                .snapshot()
                .get("reload-a.ribbon.NFLoadBalancerRuleClassName")
                .map(String::as_str),
            Some("RoundRobinRule")
        );
    }
}
