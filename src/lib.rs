//! Per-client component factory for client-side load balancing.
//!
//! Every named client gets an isolated context holding its own load
//! balancer, health check, rule, server list and server list filter. Which
//! implementation a client uses is read from `<client>.ribbon.<Property>`
//! keys; unconfigured kinds fall back to an optional external bean provider.
//!
//! ```text
//! properties ──▶ PropertiesResolver ──▶ ClientFactory ──▶ ClientContext (per name)
//!                                            │                 │
//!                                            ▼                 ▼
//!                                   InstantiationEngine ◀── BeanLookup (autowiring)
//!                                            │
//!                                            ▼
//!                                    ComponentRegistry
//! ```

// Core subsystems
pub mod capability;
pub mod components;
pub mod context;
pub mod error;
pub mod instantiate;
pub mod properties;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use capability::{Capability, CapabilityKind, Component};
pub use config::ClientConfig;
pub use context::{BeanProvider, ClientFactory, ClientFactoryBuilder, StaticBeanProvider};
pub use error::{ComponentError, ComponentResult};
pub use instantiate::{ComponentRegistry, Constructors, InstantiationEngine};
pub use lifecycle::Runtime;
