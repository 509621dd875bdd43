//! Server list filters.

use std::sync::Arc;

use crate::components::{Lifecycle, Server, ServerListFilter};
use crate::config::{keys, ClientConfig};

/// Returns the list unchanged.
#[derive(Debug, Default)]
pub struct PassThroughServerListFilter;

impl Lifecycle for PassThroughServerListFilter {}

impl ServerListFilter for PassThroughServerListFilter {
    fn filtered_servers(&self, servers: Vec<Arc<Server>>) -> Vec<Arc<Server>> {
        servers
    }
}

/// Keeps a bounded subset of live servers.
///
/// Constructed directly from the client configuration
/// (`ServerListSubsetFilter.size`, default 20).
#[derive(Debug)]
pub struct ServerListSubsetFilter {
    size: usize,
}

impl ServerListSubsetFilter {
    pub const DEFAULT_SIZE: usize = 20;

    pub fn with_config(config: &ClientConfig) -> Self {
        let size = config
            .get_usize(keys::SUBSET_SIZE)
            .unwrap_or(Self::DEFAULT_SIZE);
        Self { size }
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Lifecycle for ServerListSubsetFilter {}

impl ServerListFilter for ServerListSubsetFilter {
    fn filtered_servers(&self, servers: Vec<Arc<Server>>) -> Vec<Arc<Server>> {
        servers
            .into_iter()
            .filter(|s| s.is_alive())
            .take(self.size)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subset_size_from_config() {
        let config = ClientConfig::builder("svc")
            .property(keys::SUBSET_SIZE, "2")
            .build();
        let filter = ServerListSubsetFilter::with_config(&config);
        assert_eq!(filter.size(), 2);

        let servers: Vec<Arc<Server>> = (0..4)
            .map(|i| Arc::new(Server::new("10.0.0.1", 8000 + i)))
            .collect();
        servers[0].set_alive(false);

        let kept: Vec<u16> = filter
            .filtered_servers(servers)
            .iter()
            .map(|s| s.port())
            .collect();
        assert_eq!(kept, vec![8001, 8002]);
    }

    #[test]
    fn test_subset_default_size() {
        let filter = ServerListSubsetFilter::with_config(&ClientConfig::builder("svc").build());
        assert_eq!(filter.size(), ServerListSubsetFilter::DEFAULT_SIZE);
    }
}
