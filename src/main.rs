//! ribbon-factory command line.
//!
//! Loads a factory configuration file and inspects or serves the per-client
//! component contexts it describes.
//!
//! ```text
//! ribbon-factory -c ribbon.toml resolve myservice    components of one client as JSON
//! ribbon-factory -c ribbon.toml keys myservice       property keys consulted for a client
//! ribbon-factory -c ribbon.toml check                validate the file against the registry
//! ribbon-factory -c ribbon.toml watch                keep contexts in sync with the file
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use ribbon_factory::components::LoadBalancer;
use ribbon_factory::config::validation::validate_identifiers;
use ribbon_factory::config::watcher::ConfigWatcher;
use ribbon_factory::config::{load_config, FactoryConfig};
use ribbon_factory::lifecycle::{self, Runtime};
use ribbon_factory::observability::logging;
use ribbon_factory::properties::PropertiesResolver;
use ribbon_factory::{CapabilityKind, ComponentRegistry};

#[derive(Parser)]
#[command(name = "ribbon-factory")]
#[command(about = "Per-client load balancer component factory", long_about = None)]
struct Cli {
    /// Factory configuration file (TOML).
    #[arg(short, long, default_value = "ribbon.toml")]
    config: PathBuf,

    /// Log filter; overrides `observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the components of a client and print them as JSON
    Resolve {
        client: String,
        /// Only these kinds (name or property name); defaults to all
        #[arg(short, long)]
        kind: Vec<CapabilityKind>,
    },
    /// Show the property keys consulted for a client and their values
    Keys { client: String },
    /// Validate the configuration file
    Check,
    /// Watch the configuration file and dispose contexts of changed clients
    Watch,
}

#[derive(Serialize)]
struct ResolvedComponent {
    kind: CapabilityKind,
    property: String,
    identifier: Option<String>,
    component: Option<&'static str>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let filter = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.observability.log_level.clone());
    logging::init(&filter);

    tracing::debug!(path = ?cli.config, "Configuration loaded");

    match cli.command {
        Commands::Resolve { client, kind } => {
            let runtime = lifecycle::start(&config, ComponentRegistry::with_defaults())?;
            resolve(&runtime, &client, &kind)?;
        }
        Commands::Keys { client } => {
            let runtime = lifecycle::start(&config, ComponentRegistry::with_defaults())?;
            keys(&runtime, &client);
        }
        Commands::Check => check(&config)?,
        Commands::Watch => {
            let runtime = lifecycle::start(&config, ComponentRegistry::with_defaults())?;
            watch(runtime, &cli.config, &config).await?;
        }
    }

    Ok(())
}

fn resolve(
    runtime: &Runtime,
    client: &str,
    kinds: &[CapabilityKind],
) -> Result<(), Box<dyn std::error::Error>> {
    let factory = runtime.factory();
    let kinds = if kinds.is_empty() {
        CapabilityKind::ALL.to_vec()
    } else {
        kinds.to_vec()
    };

    let mut components = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let component = factory.get_component(client, kind)?;
        components.push(ResolvedComponent {
            kind,
            property: PropertiesResolver::property_key(kind, client),
            identifier: factory.resolver().class_name(kind, client),
            component: component.as_ref().map(|c| c.type_name()),
        });
    }

    let servers: Vec<String> = match factory.load_balancer(client)? {
        Some(lb) => lb.reachable_servers().iter().map(|s| s.id()).collect(),
        None => Vec::new(),
    };

    let output = json!({
        "client": client,
        "generation": factory.context_generation(client),
        "components": components,
        "reachable_servers": servers,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn keys(runtime: &Runtime, client: &str) {
    let resolver = runtime.factory().resolver();
    for kind in CapabilityKind::ALL {
        let key = PropertiesResolver::property_key(kind, client);
        match resolver.class_name(kind, client) {
            Some(identifier) => println!("{} = {}", key, identifier),
            None => println!("{} (unset)", key),
        }
    }
}

fn check(config: &FactoryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = ComponentRegistry::with_defaults();
    match validate_identifiers(config, &registry) {
        Ok(()) => {
            println!("Configuration OK");
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                eprintln!("error: {}", error);
            }
            Err(format!("{} invalid component properties", errors.len()).into())
        }
    }
}

async fn watch(
    runtime: Runtime,
    path: &Path,
    config: &FactoryConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if !config.watch.enabled {
        tracing::warn!("watch.enabled is false in the configuration, watching anyway");
    }

    let poll_interval = Duration::from_secs(config.watch.poll_interval_secs.max(1));
    let (watcher, mut updates) = ConfigWatcher::new(path, poll_interval);
    // Dropping the handle stops the watcher
    let _handle = watcher.run()?;

    loop {
        tokio::select! {
            Some(new_config) = updates.recv() => {
                match runtime.reload(&new_config) {
                    Ok(changes) if changes.is_empty() => {}
                    Ok(changes) => {
                        tracing::info!(clients = ?changes.clients, global = changes.global, "Contexts invalidated");
                    }
                    Err(e) => {
                        tracing::error!("Rejected configuration reload: {}. Keeping current configuration.", e);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    let disposed = runtime.factory().dispose_all();
    tracing::info!(disposed, "Shutdown complete");
    Ok(())
}
