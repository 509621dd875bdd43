//! Configuration schema definitions.
//!
//! This module defines the factory configuration file. All types derive
//! Serde traits for deserialization from TOML.
//!
//! ```toml
//! [observability]
//! log_level = "debug"
//!
//! [eager_load]
//! enabled = true
//! clients = ["myservice"]
//!
//! [properties.myservice.ribbon]
//! NFLoadBalancerRuleClassName = "RoundRobinRule"
//! listOfServers = ["10.0.0.1:8080", "10.0.0.2:8080"]
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::loader::flatten_properties;

/// Root configuration of the component factory.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FactoryConfig {
    /// Nested property tables, flattened to dotted keys on use.
    pub properties: toml::Table,

    /// Clients whose contexts are created at startup.
    pub eager_load: EagerLoadConfig,

    /// Hot reload of the configuration file.
    pub watch: WatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl FactoryConfig {
    /// Properties as dotted keys (`myservice.ribbon.listOfServers`).
    pub fn flattened_properties(&self) -> HashMap<String, String> {
        flatten_properties(&self.properties)
    }
}

/// Eager context initialization.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EagerLoadConfig {
    /// Enable eager initialization.
    pub enabled: bool,

    /// Client names to initialize.
    pub clients: Vec<String>,
}

/// Configuration file watching.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Reload properties when the file changes.
    pub enabled: bool,

    /// Poll interval for the file watcher in seconds.
    pub poll_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_secs: 2,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
