//! Component resolution errors.

use thiserror::Error;

use crate::capability::CapabilityKind;
use crate::components::BoxError;

/// Errors that can occur while resolving or constructing a component.
///
/// "Nothing configured" is not an error; it surfaces as `Ok(None)`.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// The configured identifier is not registered for the capability.
    #[error("Unknown class to load {identifier} for {kind} named {client}")]
    UnknownIdentifier {
        identifier: String,
        kind: CapabilityKind,
        client: String,
    },

    /// The identifier is registered but its fallback construction failed.
    #[error("Failed to construct {identifier} for {kind} named {client}: {source}")]
    ConstructionFailure {
        identifier: String,
        kind: CapabilityKind,
        client: String,
        #[source]
        source: BoxError,
    },
}

impl ComponentError {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            ComponentError::UnknownIdentifier { kind, .. } => *kind,
            ComponentError::ConstructionFailure { kind, .. } => *kind,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            ComponentError::UnknownIdentifier { identifier, .. } => identifier,
            ComponentError::ConstructionFailure { identifier, .. } => identifier,
        }
    }

    pub fn client(&self) -> &str {
        match self {
            ComponentError::UnknownIdentifier { client, .. } => client,
            ComponentError::ConstructionFailure { client, .. } => client,
        }
    }
}

/// Result type for component resolution.
pub type ComponentResult<T> = Result<T, ComponentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ComponentError::UnknownIdentifier {
            identifier: "com.example.DoesNotExist".into(),
            kind: CapabilityKind::Rule,
            client: "myservice".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown class to load com.example.DoesNotExist for Rule named myservice"
        );

        let err = ComponentError::ConstructionFailure {
            identifier: "Broken".into(),
            kind: CapabilityKind::HealthCheck,
            client: "svc".into(),
            source: "boom".into(),
        };
        assert!(err.to_string().ends_with(": boom"));
        assert_eq!(err.kind(), CapabilityKind::HealthCheck);
        assert_eq!(err.client(), "svc");
    }
}
