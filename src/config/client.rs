//! Per-client configuration handle.
//!
//! # Lookup order
//! ```text
//! get("listOfServers") for client "myservice":
//!     programmatic overrides
//!     → myservice.ribbon.listOfServers
//!     → ribbon.listOfServers (global default)
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::capability::NAMESPACE;
use crate::properties::PropertySource;

/// Well-known client property names.
pub mod keys {
    /// Comma-separated `host:port` entries read by `ConfigurationBasedServerList`.
    pub const LIST_OF_SERVERS: &str = "listOfServers";
    /// Subset size of `ServerListSubsetFilter`.
    pub const SUBSET_SIZE: &str = "ServerListSubsetFilter.size";
}

/// Configuration scoped to one client name, shared read-only with its components.
#[derive(Clone)]
pub struct ClientConfig {
    client_name: String,
    source: Option<Arc<dyn PropertySource>>,
    overrides: HashMap<String, String>,
}

impl ClientConfig {
    /// Configuration backed by `source`.
    pub fn new(client_name: impl Into<String>, source: Arc<dyn PropertySource>) -> Self {
        Self {
            client_name: client_name.into(),
            source: Some(source),
            overrides: HashMap::new(),
        }
    }

    pub fn builder(client_name: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self {
                client_name: client_name.into(),
                source: None,
                overrides: HashMap::new(),
            },
        }
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Raw property value for this client.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.overrides.get(key) {
            return Some(value.clone());
        }
        let source = self.source.as_ref()?;
        source
            .get_property(&format!("{}.{}.{}", self.client_name, NAMESPACE, key))
            .or_else(|| source.get_property(&format!("{}.{}", NAMESPACE, key)))
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        let value = self.get(key)?;
        match value.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => {
                tracing::warn!(client = %self.client_name, key, value = %value, "Ignoring non-boolean property");
                None
            }
        }
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        let value = self.get(key)?;
        match value.trim().parse() {
            Ok(n) => Some(n),
            Err(_) => {
                tracing::warn!(client = %self.client_name, key, value = %value, "Ignoring non-numeric property");
                None
            }
        }
    }

    /// Comma-separated list; blank entries are dropped.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_name", &self.client_name)
            .field("overrides", &self.overrides)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

/// Builder for [`ClientConfig`].
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn source(mut self, source: Arc<dyn PropertySource>) -> Self {
        self.config.source = Some(source);
        self
    }

    /// Override a property for this client only.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.overrides.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::MapPropertySource;

    fn source() -> Arc<dyn PropertySource> {
        Arc::new(
            MapPropertySource::default()
                .with("svc.ribbon.listOfServers", "a:1,b:2")
                .with("ribbon.listOfServers", "global:1")
                .with("ribbon.ConnectTimeout", "250")
                .with("svc.ribbon.IsSecure", "TRUE")
                .with("svc.ribbon.MaxAutoRetries", "many"),
        )
    }

    #[test]
    fn test_lookup_order() {
        let config = ClientConfig::new("svc", source());
        assert_eq!(config.get_list(keys::LIST_OF_SERVERS), vec!["a:1", "b:2"]);
        assert_eq!(config.get_usize("ConnectTimeout"), Some(250));

        let other = ClientConfig::new("other", source());
        assert_eq!(other.get_list(keys::LIST_OF_SERVERS), vec!["global:1"]);

        let overridden = ClientConfig::builder("svc")
            .source(source())
            .property(keys::LIST_OF_SERVERS, "c:3")
            .build();
        assert_eq!(overridden.get(keys::LIST_OF_SERVERS).as_deref(), Some("c:3"));
    }

    #[test]
    fn test_typed_getters() {
        let config = ClientConfig::new("svc", source());
        assert_eq!(config.get_bool("IsSecure"), Some(true));
        assert_eq!(config.get_usize("MaxAutoRetries"), None);
        assert_eq!(config.get_or("Missing", "x"), "x");
        assert!(config.get_list("Missing").is_empty());
    }
}
