//! Capability contracts and reference implementations.
//!
//! # Data Flow
//! ```text
//! ServerList (server_list.rs)      → initial / updated servers
//!     → ServerListFilter (filter.rs) → candidate servers
//!     → Ping (ping.rs)               → liveness flags on server.rs
//!     → Rule (rule.rs)               → one selected server
//! LoadBalancer (load_balancer.rs) composes the four above
//! ```
//!
//! # Design Decisions
//! - Every capability trait extends `Lifecycle`; hooks are opt-in by
//!   overriding `as_config_aware` / `as_autowire` / `release`
//! - Implementations are intentionally small; the factory only wires them
//! - All capability objects are `Send + Sync` and shared via `Arc`

pub mod filter;
pub mod load_balancer;
pub mod ping;
pub mod rule;
pub mod server;
pub mod server_list;

use std::sync::Arc;

use crate::capability::{Capability, CapabilityKind, Component};
use crate::config::ClientConfig;
use crate::error::ComponentError;

pub use filter::{PassThroughServerListFilter, ServerListSubsetFilter};
pub use load_balancer::BaseLoadBalancer;
pub use ping::NoOpPing;
pub use rule::{BestAvailableRule, RandomRule, RoundRobinRule};
pub use server::Server;
pub use server_list::ConfigurationBasedServerList;

/// Error type returned by component constructors and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Hooks shared by every capability.
pub trait Lifecycle: Send + Sync {
    /// Concrete type name, for logs and diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Return `Some(self)` to receive the client configuration after default construction.
    fn as_config_aware(&mut self) -> Option<&mut dyn ClientConfigAware> {
        None
    }

    /// Return `Some(self)` to have dependencies injected after construction.
    fn as_autowire(&mut self) -> Option<&mut dyn Autowire> {
        None
    }

    /// Called once when the owning context is disposed.
    fn release(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Receives the client configuration after default construction.
pub trait ClientConfigAware {
    fn init_with_config(&mut self, config: &ClientConfig) -> Result<(), BoxError>;
}

/// Receives sibling components after construction.
pub trait Autowire {
    fn autowire(&mut self, beans: &dyn BeanLookup) -> Result<(), BoxError>;
}

/// Lookup of components belonging to one client, handed to [`Autowire`].
pub trait BeanLookup {
    /// Name of the client being wired.
    fn client_name(&self) -> &str;

    /// Resolve the component of `kind` for the same client.
    fn lookup(&self, kind: CapabilityKind) -> Result<Option<Component>, ComponentError>;
}

impl<'a> dyn BeanLookup + 'a {
    /// Typed variant of [`BeanLookup::lookup`].
    pub fn get<C: Capability + ?Sized>(&self) -> Result<Option<Arc<C>>, ComponentError> {
        Ok(self.lookup(C::KIND)?.and_then(C::from_component))
    }
}

/// Chooses servers for one client.
pub trait LoadBalancer: Lifecycle {
    /// Add servers to the pool; duplicates (same id) are ignored.
    fn add_servers(&self, servers: Vec<Arc<Server>>);

    /// Pick a server for the next request.
    fn choose_server(&self) -> Option<Arc<Server>>;

    /// Mark a server as down so it is no longer chosen.
    fn mark_server_down(&self, server: &Server);

    /// Servers currently considered up.
    fn reachable_servers(&self) -> Vec<Arc<Server>>;

    /// All known servers.
    fn all_servers(&self) -> Vec<Arc<Server>>;
}

/// Liveness check for a single server.
pub trait Ping: Lifecycle {
    fn is_alive(&self, server: &Server) -> bool;
}

/// Selection rule.
pub trait Rule: Lifecycle {
    /// Select one server out of `servers`, or `None` if none qualifies.
    fn choose(&self, servers: &[Arc<Server>]) -> Option<Arc<Server>>;
}

/// Source of servers for a client.
pub trait ServerList: Lifecycle {
    fn initial_servers(&self) -> Vec<Arc<Server>>;

    fn updated_servers(&self) -> Vec<Arc<Server>>;
}

/// Narrows a server list before the rule sees it.
pub trait ServerListFilter: Lifecycle {
    fn filtered_servers(&self, servers: Vec<Arc<Server>>) -> Vec<Arc<Server>>;
}
