//! Server abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server of a client
//! - Track active requests (for the best-available rule)
//! - Track liveness as reported by pings or by the load balancer

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Error parsing a `host[:port]` server entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServerParseError {
    #[error("empty server entry")]
    Empty,
    #[error("invalid port in server entry '{0}'")]
    InvalidPort(String),
}

/// A single server.
#[derive(Debug)]
pub struct Server {
    host: String,
    port: u16,
    /// Liveness flag; servers start alive.
    alive: AtomicBool,
    /// Number of requests currently in flight.
    active_requests: AtomicUsize,
}

impl Server {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            alive: AtomicBool::new(true),
            active_requests: AtomicUsize::new(0),
        }
    }

    /// Parse `host`, `host:port` or `scheme://host:port`.
    ///
    /// The port defaults to 443 for `https://` entries and 80 otherwise.
    pub fn parse(entry: &str) -> Result<Self, ServerParseError> {
        let entry = entry.trim();
        let (rest, default_port) = if let Some(rest) = entry.strip_prefix("https://") {
            (rest, 443)
        } else if let Some(rest) = entry.strip_prefix("http://") {
            (rest, 80)
        } else {
            (entry, 80)
        };
        let rest = rest.trim_end_matches('/');
        if rest.is_empty() {
            return Err(ServerParseError::Empty);
        }

        match rest.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => {
                let port = port
                    .parse()
                    .map_err(|_| ServerParseError::InvalidPort(entry.to_string()))?;
                Ok(Self::new(host, port))
            }
            Some(_) => Err(ServerParseError::Empty),
            None => Ok(Self::new(rest, default_port)),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` identifier.
    pub fn id(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Relaxed);
    }

    /// Get the current number of in-flight requests.
    pub fn active_requests(&self) -> usize {
        self.active_requests.load(Ordering::Relaxed)
    }

    /// Count a request as in flight until the returned guard is dropped.
    pub fn start_request(self: &Arc<Self>) -> ActiveRequestGuard {
        self.active_requests.fetch_add(1, Ordering::Relaxed);
        ActiveRequestGuard {
            server: self.clone(),
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A RAII guard that manages the active request count.
#[derive(Debug)]
pub struct ActiveRequestGuard {
    server: Arc<Server>,
}

impl Deref for ActiveRequestGuard {
    type Target = Server;
    fn deref(&self) -> &Self::Target {
        &self.server
    }
}

impl Drop for ActiveRequestGuard {
    fn drop(&mut self) {
        self.server.active_requests.fetch_sub(1, Ordering::Relaxed);
    }
}
