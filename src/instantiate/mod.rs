//! Component instantiation subsystem.
//!
//! # Data Flow
//! ```text
//! (kind, identifier, ClientConfig, wiring)
//!     → registry.rs (identifier → registered constructors)
//!     → engine.rs (ordered builder chain)
//!     → Component
//! ```
//!
//! # Design Decisions
//! - Implementations are registered up front; identifiers are never loaded dynamically
//! - The registry is immutable once shared with an engine
//! - Construction never caches; the context layer owns instance lifetime

pub mod engine;
pub mod registry;

pub use engine::{BuildStrategy, InstantiationEngine};
pub use registry::{ComponentRegistry, Constructors};
