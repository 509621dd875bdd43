//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, flatten [properties] to dotted keys)
//!     → validation.rs (semantic checks, registered identifiers)
//!     → FactoryConfig (validated, immutable)
//!     → properties::ReloadablePropertySource
//!     → client.rs (ClientConfig per client name)
//!
//! On file change:
//!     watcher.rs detects change (content differs, file not mid-write)
//!     → loader.rs parses and validates the new content
//!     → lifecycle::reload swaps the property snapshot
//!     → contexts of affected clients are disposed
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod client;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use client::{keys, ClientConfig, ClientConfigBuilder};
pub use loader::{load_config, ConfigError};
pub use schema::{EagerLoadConfig, FactoryConfig, ObservabilityConfig, WatchConfig};
pub use validation::ValidationError;
