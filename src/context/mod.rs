//! Per-client context management.
//!
//! # Data Flow
//! ```text
//! get_component(name, kind)
//!     → factory.rs: slot fast path, else get-or-create the ClientContext
//!       (double-checked under a name-scoped lock)
//!     → client_context.rs: lifecycle read lock → slot mutex → re-check
//!         configured?   → InstantiationEngine (wired via the same context)
//!         unconfigured? → beans.rs BeanProvider
//!         neither       → Ok(None), nothing cached
//!
//! dispose_context(name)
//!     → remove from the map under the name lock
//!     → lifecycle write lock, mark disposed, empty slots, release instances
//! ```
//!
//! # Design Decisions
//! - Every name owns an isolated context; contexts never share instances
//!   they built
//! - A disposed context is never reused; the next access builds a new
//!   generation
//! - Creation locks are per name and per slot, so unrelated clients and
//!   unrelated kinds never wait on each other

pub mod beans;
pub mod client_context;
pub mod factory;

pub use beans::{BeanProvider, StaticBeanProvider};
pub use client_context::ClientContext;
pub use factory::{ClientFactory, ClientFactoryBuilder};
