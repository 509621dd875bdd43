//! Property sources.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::capability::NAMESPACE;

/// Read-only key/value lookup.
pub trait PropertySource: Send + Sync {
    fn get_property(&self, key: &str) -> Option<String>;
}

/// In-memory properties.
#[derive(Debug, Clone, Default)]
pub struct MapPropertySource {
    properties: HashMap<String, String>,
}

impl MapPropertySource {
    pub fn new(properties: HashMap<String, String>) -> Self {
        Self { properties }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapPropertySource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            properties: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl PropertySource for MapPropertySource {
    fn get_property(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }
}

/// Process environment.
///
/// Tries the exact key first, then the relaxed form: upper case with `.`
/// and `-` replaced by `_` (`myservice.ribbon.listOfServers` →
/// `MYSERVICE_RIBBON_LISTOFSERVERS`).
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvPropertySource;

impl EnvPropertySource {
    pub fn relaxed_key(key: &str) -> String {
        key.chars()
            .map(|c| match c {
                '.' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect()
    }
}

impl PropertySource for EnvPropertySource {
    fn get_property(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .or_else(|| std::env::var(Self::relaxed_key(key)).ok())
    }
}

/// Ordered layers; the first layer holding a key wins.
#[derive(Clone, Default)]
pub struct LayeredPropertySource {
    layers: Vec<Arc<dyn PropertySource>>,
}

impl LayeredPropertySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer with lower precedence than the existing ones.
    pub fn with_layer(mut self, layer: Arc<dyn PropertySource>) -> Self {
        self.layers.push(layer);
        self
    }
}

impl PropertySource for LayeredPropertySource {
    fn get_property(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get_property(key))
    }
}

/// Properties snapshot that can be swapped atomically on reload.
#[derive(Debug, Default)]
pub struct ReloadablePropertySource {
    current: ArcSwap<HashMap<String, String>>,
}

impl ReloadablePropertySource {
    pub fn new(properties: HashMap<String, String>) -> Self {
        Self {
            current: ArcSwap::from_pointee(properties),
        }
    }

    /// The snapshot currently served.
    pub fn snapshot(&self) -> Arc<HashMap<String, String>> {
        self.current.load_full()
    }

    /// Install a new snapshot and return the previous one.
    pub fn replace(&self, properties: HashMap<String, String>) -> Arc<HashMap<String, String>> {
        self.current.swap(Arc::new(properties))
    }
}

impl PropertySource for ReloadablePropertySource {
    fn get_property(&self, key: &str) -> Option<String> {
        self.current.load().get(key).cloned()
    }
}

/// Clients affected by a properties change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyChanges {
    /// Clients with at least one changed `<client>.ribbon.*` key.
    pub clients: BTreeSet<String>,
    /// True if a global `ribbon.*` key changed (affects every client).
    pub global: bool,
}

impl PropertyChanges {
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty() && !self.global
    }
}

/// Compare two snapshots and report which clients are affected.
///
/// Keys outside the namespace are ignored.
pub fn diff_properties(
    old: &HashMap<String, String>,
    new: &HashMap<String, String>,
) -> PropertyChanges {
    let global_prefix = format!("{}.", NAMESPACE);
    let marker = format!(".{}.", NAMESPACE);
    let mut changes = PropertyChanges::default();

    let keys = old.keys().chain(new.keys()).collect::<BTreeSet<_>>();
    for key in keys {
        if old.get(key) == new.get(key) {
            continue;
        }
        if key.starts_with(&global_prefix) {
            changes.global = true;
        } else if let Some(pos) = key.find(&marker) {
            changes.clients.insert(key[..pos].to_string());
        }
    }
    changes
}
