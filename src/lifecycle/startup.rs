//! Startup sequence.

use std::sync::Arc;

use thiserror::Error;

use crate::config::validation::validate_identifiers;
use crate::config::{ConfigError, FactoryConfig};
use crate::context::ClientFactory;
use crate::error::ComponentError;
use crate::instantiate::ComponentRegistry;
use crate::properties::{EnvPropertySource, LayeredPropertySource, ReloadablePropertySource};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("eager initialization failed: {0}")]
    EagerLoad(#[from] ComponentError),
}

/// A running factory together with the property snapshot it reads.
pub struct Runtime {
    pub(crate) properties: Arc<ReloadablePropertySource>,
    pub(crate) factory: Arc<ClientFactory>,
}

impl Runtime {
    pub fn factory(&self) -> &Arc<ClientFactory> {
        &self.factory
    }

    /// File properties currently served.
    pub fn properties(&self) -> &Arc<ReloadablePropertySource> {
        &self.properties
    }
}

/// Build a factory for `config`, eagerly initializing the configured clients.
pub fn start(config: &FactoryConfig, registry: ComponentRegistry) -> Result<Runtime, StartupError> {
    validate_identifiers(config, &registry).map_err(ConfigError::Validation)?;

    let properties = Arc::new(ReloadablePropertySource::new(config.flattened_properties()));
    let source = LayeredPropertySource::new()
        .with_layer(Arc::new(EnvPropertySource))
        .with_layer(properties.clone());

    let factory = Arc::new(
        ClientFactory::builder()
            .property_source(Arc::new(source))
            .registry(registry)
            .build(),
    );

    tracing::info!(
        properties = properties.snapshot().len(),
        registered = factory.registry().len(),
        "Client factory started"
    );

    if config.eager_load.enabled {
        factory.initialize_eager(&config.eager_load.clients)?;
    }

    Ok(Runtime {
        properties,
        factory,
    })
}
