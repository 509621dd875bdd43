//! Metrics collection.
//!
//! # Metrics
//! - `ribbon_contexts_created_total` (counter): client contexts created
//! - `ribbon_contexts_disposed_total` (counter): client contexts disposed
//! - `ribbon_components_built_total` (counter): instances built, by kind and strategy
//! - `ribbon_resolution_errors_total` (counter): failed resolutions, by kind
//! - `ribbon_release_failures_total` (counter): release hooks that returned an error, by kind
//!
//! # Design Decisions
//! - Labels are static strings only (kind, strategy); client names are unbounded
//!   and stay in logs
//! - Updates are no-ops until a recorder is installed

use crate::capability::CapabilityKind;
use crate::instantiate::BuildStrategy;

pub fn record_context_created() {
    ::metrics::counter!("ribbon_contexts_created_total").increment(1);
}

pub fn record_context_disposed() {
    ::metrics::counter!("ribbon_contexts_disposed_total").increment(1);
}

pub fn record_component_built(kind: CapabilityKind, strategy: BuildStrategy) {
    ::metrics::counter!(
        "ribbon_components_built_total",
        "kind" => kind.as_str(),
        "strategy" => strategy.as_str()
    )
    .increment(1);
}

pub fn record_resolution_error(kind: CapabilityKind) {
    ::metrics::counter!("ribbon_resolution_errors_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_release_failure(kind: CapabilityKind) {
    ::metrics::counter!("ribbon_release_failures_total", "kind" => kind.as_str()).increment(1);
}
