//! Server list read from the client configuration.

use std::sync::Arc;

use crate::components::{BoxError, ClientConfigAware, Lifecycle, Server, ServerList};
use crate::config::{keys, ClientConfig};

/// Servers listed in the `listOfServers` property of the client.
///
/// Built by default construction; the list is read in `init_with_config`.
#[derive(Debug, Default)]
pub struct ConfigurationBasedServerList {
    client_name: String,
    servers: Vec<Arc<Server>>,
}

impl ConfigurationBasedServerList {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Lifecycle for ConfigurationBasedServerList {
    fn as_config_aware(&mut self) -> Option<&mut dyn ClientConfigAware> {
        Some(self)
    }
}

impl ClientConfigAware for ConfigurationBasedServerList {
    fn init_with_config(&mut self, config: &ClientConfig) -> Result<(), BoxError> {
        self.client_name = config.client_name().to_string();
        let mut servers = Vec::new();
        for entry in config.get_list(keys::LIST_OF_SERVERS) {
            let server = Server::parse(&entry).map_err(|e| {
                format!("invalid {} entry for client '{}': {}", keys::LIST_OF_SERVERS, self.client_name, e)
            })?;
            servers.push(Arc::new(server));
        }
        tracing::debug!(
            client = %self.client_name,
            servers = servers.len(),
            "Server list loaded from configuration"
        );
        self.servers = servers;
        Ok(())
    }
}

impl ServerList for ConfigurationBasedServerList {
    fn initial_servers(&self) -> Vec<Arc<Server>> {
        self.servers.clone()
    }

    fn updated_servers(&self) -> Vec<Arc<Server>> {
        self.servers.clone()
    }
}
