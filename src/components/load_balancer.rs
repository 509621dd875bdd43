//! Base load balancer.
//!
//! # Responsibilities
//! - Hold the server pool of one client
//! - Apply the filter and rule wired from the same client context
//! - Refresh liveness with the wired ping
//!
//! # Design Decisions
//! - Default-constructed, then configured (`init_with_config`) and wired
//!   (`autowire`) by the instantiation engine
//! - Falls back to `RoundRobinRule` when no rule is wired

use std::sync::{Arc, RwLock};

use crate::capability::CapabilityKind;
use crate::components::{
    Autowire, BeanLookup, BoxError, ClientConfigAware, Lifecycle, LoadBalancer, Ping,
    RoundRobinRule, Rule, Server, ServerList, ServerListFilter,
};
use crate::config::ClientConfig;

/// Load balancer composed from the client's rule, ping, server list and filter.
#[derive(Default)]
pub struct BaseLoadBalancer {
    client_name: String,
    rule: Option<Arc<dyn Rule>>,
    ping: Option<Arc<dyn Ping>>,
    server_list: Option<Arc<dyn ServerList>>,
    filter: Option<Arc<dyn ServerListFilter>>,
    /// Used while no rule is wired.
    fallback_rule: RoundRobinRule,
    servers: RwLock<Vec<Arc<Server>>>,
}

impl BaseLoadBalancer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// The wired rule, if any.
    pub fn rule(&self) -> Option<&Arc<dyn Rule>> {
        self.rule.as_ref()
    }

    /// Replace the pool with the wired server list's current servers.
    pub fn refresh_servers(&self) {
        let Some(list) = &self.server_list else {
            return;
        };
        let updated = list.updated_servers();
        let mut servers = self.servers.write().unwrap_or_else(|e| e.into_inner());
        *servers = updated;
        tracing::debug!(client = %self.client_name, servers = servers.len(), "Server list refreshed");
    }

    /// Ping every server and update its liveness flag.
    pub fn ping_servers(&self) {
        let Some(ping) = &self.ping else {
            return;
        };
        for server in self.all_servers() {
            let alive = ping.is_alive(&server);
            if alive != server.is_alive() {
                tracing::info!(client = %self.client_name, server = %server, alive, "Server liveness changed");
            }
            server.set_alive(alive);
        }
    }

    fn candidates(&self) -> Vec<Arc<Server>> {
        let reachable = self.reachable_servers();
        match &self.filter {
            Some(filter) => filter.filtered_servers(reachable),
            None => reachable,
        }
    }
}

impl Lifecycle for BaseLoadBalancer {
    fn as_config_aware(&mut self) -> Option<&mut dyn ClientConfigAware> {
        Some(self)
    }

    fn as_autowire(&mut self) -> Option<&mut dyn Autowire> {
        Some(self)
    }

    fn release(&self) -> Result<(), BoxError> {
        self.servers.write().unwrap_or_else(|e| e.into_inner()).clear();
        Ok(())
    }
}

impl ClientConfigAware for BaseLoadBalancer {
    fn init_with_config(&mut self, config: &ClientConfig) -> Result<(), BoxError> {
        self.client_name = config.client_name().to_string();
        Ok(())
    }
}

impl Autowire for BaseLoadBalancer {
    fn autowire(&mut self, beans: &dyn BeanLookup) -> Result<(), BoxError> {
        self.rule = beans.get::<dyn Rule>()?;
        self.ping = beans.get::<dyn Ping>()?;
        self.server_list = beans.get::<dyn ServerList>()?;
        self.filter = beans.get::<dyn ServerListFilter>()?;

        if let Some(list) = &self.server_list {
            self.add_servers(list.initial_servers());
        }

        tracing::debug!(
            client = %beans.client_name(),
            rule = self.rule.is_some(),
            ping = self.ping.is_some(),
            server_list = self.server_list.is_some(),
            filter = self.filter.is_some(),
            "Load balancer wired"
        );
        Ok(())
    }
}

impl LoadBalancer for BaseLoadBalancer {
    fn add_servers(&self, new_servers: Vec<Arc<Server>>) {
        let mut servers = self.servers.write().unwrap_or_else(|e| e.into_inner());
        for server in new_servers {
            if !servers.iter().any(|s| s.id() == server.id()) {
                servers.push(server);
            }
        }
    }

    fn choose_server(&self) -> Option<Arc<Server>> {
        let candidates = self.candidates();
        let chosen = match &self.rule {
            Some(rule) => rule.choose(&candidates),
            None => self.fallback_rule.choose(&candidates),
        };
        if chosen.is_none() {
            tracing::debug!(
                client = %self.client_name,
                kind = %CapabilityKind::LoadBalancer,
                candidates = candidates.len(),
                "No server available"
            );
        }
        chosen
    }

    fn mark_server_down(&self, server: &Server) {
        let servers = self.servers.read().unwrap_or_else(|e| e.into_inner());
        for s in servers.iter().filter(|s| s.id() == server.id()) {
            s.set_alive(false);
            tracing::info!(client = %self.client_name, server = %s, "Server marked down");
        }
    }

    fn reachable_servers(&self) -> Vec<Arc<Server>> {
        self.servers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|s| s.is_alive())
            .cloned()
            .collect()
    }

    fn all_servers(&self) -> Vec<Arc<Server>> {
        self.servers.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
