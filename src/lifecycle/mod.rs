//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate identifiers → Build factory → Eager-load clients
//!
//! Reload (reload.rs):
//!     New config → Validate identifiers → Swap properties
//!         → Dispose contexts of changed clients (all of them on a global change)
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then factory, then eager contexts
//! - A rejected reload keeps the current properties and contexts untouched
//! - Environment variables override file properties

pub mod reload;
pub mod startup;

pub use startup::{start, Runtime, StartupError};
