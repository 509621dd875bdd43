//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (configured identifiers are registered)
//! - Validate value ranges (poll interval > 0, known log levels)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FactoryConfig → Result<(), Vec<ValidationError>>
//! - Identifier checks need the registry and run separately, before contexts
//!   are created

use std::fmt;

use crate::capability::{CapabilityKind, NAMESPACE};
use crate::config::schema::FactoryConfig;
use crate::instantiate::ComponentRegistry;

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `observability.log_level` is neither a level nor a filter directive.
    InvalidLogLevel(String),
    /// `eager_load.clients[index]` is blank.
    BlankEagerLoadClient { index: usize },
    /// `watch.poll_interval_secs` is zero while watching is enabled.
    ZeroPollInterval,
    /// A component property names an identifier that is not registered.
    UnknownIdentifier {
        key: String,
        kind: CapabilityKind,
        identifier: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidLogLevel(level) => {
                write!(f, "invalid log level '{}'", level)
            }
            ValidationError::BlankEagerLoadClient { index } => {
                write!(f, "eager_load.clients[{}] is blank", index)
            }
            ValidationError::ZeroPollInterval => {
                write!(f, "watch.poll_interval_secs must be greater than 0")
            }
            ValidationError::UnknownIdentifier {
                key,
                kind,
                identifier,
            } => write!(f, "{} = '{}' is not a registered {}", key, identifier, kind),
        }
    }
}

/// Validate a configuration.
pub fn validate_config(config: &FactoryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let level = config.observability.log_level.trim();
    let is_directive = level.contains('=') || level.contains(',');
    if !is_directive && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.eager_load.enabled {
        for (index, client) in config.eager_load.clients.iter().enumerate() {
            if client.trim().is_empty() {
                errors.push(ValidationError::BlankEagerLoadClient { index });
            }
        }
    }

    if config.watch.enabled && config.watch.poll_interval_secs == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check every configured component identifier against the registry.
pub fn validate_identifiers(
    config: &FactoryConfig,
    registry: &ComponentRegistry,
) -> Result<(), Vec<ValidationError>> {
    let mut properties: Vec<(String, String)> = config.flattened_properties().into_iter().collect();
    properties.sort();

    let mut errors = Vec::new();
    for (key, value) in properties {
        let Some(kind) = component_kind_of(&key) else {
            continue;
        };
        let identifier = value.trim();
        if !identifier.is_empty() && !registry.contains(kind, identifier) {
            errors.push(ValidationError::UnknownIdentifier {
                key,
                kind,
                identifier: identifier.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Kind configured by `<client>.ribbon.<PropertyName>`, if `key` has that shape.
fn component_kind_of(key: &str) -> Option<CapabilityKind> {
    CapabilityKind::ALL.into_iter().find(|kind| {
        let suffix = format!(".{}.{}", NAMESPACE, kind.property_name());
        key.len() > suffix.len() && key.ends_with(&suffix)
    })
}
