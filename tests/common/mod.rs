//! Shared utilities for factory integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ribbon_factory::components::{BoxError, Lifecycle, Ping, Rule, Server};
use ribbon_factory::properties::MapPropertySource;
use ribbon_factory::{ClientFactory, ComponentRegistry, Constructors};

/// Construction and release counts shared by tracked components.
#[derive(Debug, Default)]
pub struct Counters {
    built: AtomicUsize,
    released: AtomicUsize,
}

impl Counters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn built(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

/// Rule that counts its constructions and releases.
pub struct TrackedRule {
    counters: Arc<Counters>,
}

impl TrackedRule {
    pub fn new(counters: &Arc<Counters>) -> Self {
        counters.built.fetch_add(1, Ordering::SeqCst);
        Self {
            counters: counters.clone(),
        }
    }
}

impl Lifecycle for TrackedRule {
    fn release(&self) -> Result<(), BoxError> {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Rule for TrackedRule {
    fn choose(&self, servers: &[Arc<Server>]) -> Option<Arc<Server>> {
        servers.first().cloned()
    }
}

/// Ping that counts its releases and optionally fails them.
pub struct TrackedPing {
    counters: Arc<Counters>,
    fail_release: bool,
}

impl Lifecycle for TrackedPing {
    fn release(&self) -> Result<(), BoxError> {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        if self.fail_release {
            return Err("release failed".into());
        }
        Ok(())
    }
}

impl Ping for TrackedPing {
    fn is_alive(&self, _server: &Server) -> bool {
        true
    }
}

/// Bundled implementations plus tracked ones:
/// `TrackedRule`, `SlowRule` (50ms constructor), `BrokenRule` (constructor
/// fails), `TrackedPing` and `FailingPing` (release fails).
pub fn tracked_registry(counters: &Arc<Counters>) -> ComponentRegistry {
    let mut registry = ComponentRegistry::with_defaults();

    let c = counters.clone();
    registry.register::<dyn Rule>(
        "TrackedRule",
        Constructors::new().with_default(move || Ok(Box::new(TrackedRule::new(&c)) as Box<dyn Rule>)),
    );

    let c = counters.clone();
    registry.register::<dyn Rule>(
        "SlowRule",
        Constructors::new().with_default(move || {
            thread::sleep(Duration::from_millis(50));
            Ok(Box::new(TrackedRule::new(&c)) as Box<dyn Rule>)
        }),
    );

    registry.register::<dyn Rule>(
        "BrokenRule",
        Constructors::new().with_default(|| Err("constructor exploded".into())),
    );

    for (name, fail_release) in [("TrackedPing", false), ("FailingPing", true)] {
        let c = counters.clone();
        registry.register::<dyn Ping>(
            name,
            Constructors::new().with_default(move || {
                c.built.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(TrackedPing {
                    counters: c.clone(),
                    fail_release,
                }) as Box<dyn Ping>)
            }),
        );
    }

    registry
}

/// Factory over in-memory properties with the tracked registry.
pub fn tracked_factory(properties: &[(&str, &str)], counters: &Arc<Counters>) -> ClientFactory {
    let source: MapPropertySource = properties.iter().copied().collect();
    ClientFactory::builder()
        .property_source(Arc::new(source))
        .registry(tracked_registry(counters))
        .build()
}

/// Factory over in-memory properties with the bundled registry.
pub fn factory(properties: &[(&str, &str)]) -> ClientFactory {
    let source: MapPropertySource = properties.iter().copied().collect();
    ClientFactory::new(Arc::new(source))
}
