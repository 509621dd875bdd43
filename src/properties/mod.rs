//! Property lookup subsystem.
//!
//! # Data Flow
//! ```text
//! (kind, client name)
//!     → resolver.rs builds <client>.ribbon.<PropertyNameForKind>
//!     → source.rs (map / environment / layered / reloadable lookup)
//!     → Some(identifier) or None
//! ```
//!
//! # Design Decisions
//! - Read-only: nothing in this crate writes through a `PropertySource`
//! - No caching; contexts cache instances, not identifiers
//! - Blank values count as unset

pub mod resolver;
pub mod source;

pub use resolver::PropertiesResolver;
pub use source::{
    diff_properties, EnvPropertySource, LayeredPropertySource, MapPropertySource, PropertyChanges,
    PropertySource, ReloadablePropertySource,
};
