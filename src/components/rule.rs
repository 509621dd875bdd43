//! Selection rules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::Rng;

use crate::components::{Lifecycle, Rule, Server};

/// Round-robin selector.
/// Stores an internal counter to rotate through servers.
#[derive(Debug, Default)]
pub struct RoundRobinRule {
    counter: AtomicUsize,
}

impl RoundRobinRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Lifecycle for RoundRobinRule {}

impl Rule for RoundRobinRule {
    fn choose(&self, servers: &[Arc<Server>]) -> Option<Arc<Server>> {
        if servers.is_empty() {
            return None;
        }

        // Skip dead servers, at most one full lap
        let start_count = self.counter.fetch_add(1, Ordering::Relaxed);
        let len = servers.len();

        for i in 0..len {
            let server = &servers[(start_count + i) % len];
            if server.is_alive() {
                return Some(server.clone());
            }
        }
        None
    }
}

/// Uniformly random selection among live servers.
#[derive(Debug, Default)]
pub struct RandomRule;

impl RandomRule {
    pub fn new() -> Self {
        Self
    }
}

impl Lifecycle for RandomRule {}

impl Rule for RandomRule {
    fn choose(&self, servers: &[Arc<Server>]) -> Option<Arc<Server>> {
        let alive: Vec<&Arc<Server>> = servers.iter().filter(|s| s.is_alive()).collect();
        if alive.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..alive.len());
        Some(alive[index].clone())
    }
}

/// Selects the live server with the fewest active requests.
#[derive(Debug, Default)]
pub struct BestAvailableRule;

impl BestAvailableRule {
    pub fn new() -> Self {
        Self
    }
}

impl Lifecycle for BestAvailableRule {}

impl Rule for BestAvailableRule {
    fn choose(&self, servers: &[Arc<Server>]) -> Option<Arc<Server>> {
        // Ties go to the first server (stability)
        servers
            .iter()
            .filter(|s| s.is_alive())
            .min_by_key(|s| s.active_requests())
            .cloned()
    }
}
