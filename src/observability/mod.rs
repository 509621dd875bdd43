//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events through `tracing`)
//!     → metrics.rs (counters through the `metrics` facade)
//!
//! Consumers:
//!     → stdout via the fmt layer
//!     → whichever metrics recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a subscriber or recorder; binaries do
//! - Metrics are cheap (atomic increments, no-ops without a recorder)
//! - Log fields always carry the client name and capability kind

pub mod logging;
pub mod metrics;
