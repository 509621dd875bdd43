//! Capability kinds and their configuration property names.
//!
//! # Data Flow
//! ```text
//! CapabilityKind
//!     → property_name() (fixed suffix, e.g. NFLoadBalancerRuleClassName)
//!     → properties::PropertiesResolver builds <client>.ribbon.<suffix>
//!     → component.rs (Component / ComponentBox carry one instance per kind)
//! ```
//!
//! # Design Decisions
//! - The kind → property mapping is a `match`, not a mutable table
//! - Property names are bit-exact with existing Ribbon configuration
//! - One slot per kind; `index()` addresses the slot array in a context

pub mod component;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

pub use component::{Capability, Component, ComponentBox};

/// Fixed namespace segment of every component property key.
pub const NAMESPACE: &str = "ribbon";

/// A pluggable role that can be overridden per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CapabilityKind {
    LoadBalancer,
    HealthCheck,
    Rule,
    ServerListProvider,
    ServerListFilter,
}

impl CapabilityKind {
    /// Number of capability kinds.
    pub const COUNT: usize = 5;

    /// All kinds in declaration order.
    pub const ALL: [CapabilityKind; Self::COUNT] = [
        CapabilityKind::LoadBalancer,
        CapabilityKind::HealthCheck,
        CapabilityKind::Rule,
        CapabilityKind::ServerListProvider,
        CapabilityKind::ServerListFilter,
    ];

    /// Property name suffix used to configure the implementation of this kind.
    pub fn property_name(self) -> &'static str {
        match self {
            CapabilityKind::LoadBalancer => "NFLoadBalancerClassName",
            CapabilityKind::HealthCheck => "NFLoadBalancerPingClassName",
            CapabilityKind::Rule => "NFLoadBalancerRuleClassName",
            CapabilityKind::ServerListProvider => "NIWSServerListClassName",
            CapabilityKind::ServerListFilter => "NIWSServerListFilterClassName",
        }
    }

    /// Slot index inside a client context.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Variant name as used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            CapabilityKind::LoadBalancer => "LoadBalancer",
            CapabilityKind::HealthCheck => "HealthCheck",
            CapabilityKind::Rule => "Rule",
            CapabilityKind::ServerListProvider => "ServerListProvider",
            CapabilityKind::ServerListFilter => "ServerListFilter",
        }
    }

    /// Find the kind configured by a property name suffix.
    pub fn from_property_name(property: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.property_name() == property)
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no capability kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown capability kind '{0}'")]
pub struct ParseKindError(pub String);

impl FromStr for CapabilityKind {
    type Err = ParseKindError;

    /// Accepts the variant name or the property name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| {
                k.as_str().eq_ignore_ascii_case(wanted)
                    || k.property_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_names() {
        assert_eq!(CapabilityKind::LoadBalancer.property_name(), "NFLoadBalancerClassName");
        assert_eq!(CapabilityKind::HealthCheck.property_name(), "NFLoadBalancerPingClassName");
        assert_eq!(CapabilityKind::Rule.property_name(), "NFLoadBalancerRuleClassName");
        assert_eq!(CapabilityKind::ServerListProvider.property_name(), "NIWSServerListClassName");
        assert_eq!(
            CapabilityKind::ServerListFilter.property_name(),
            "NIWSServerListFilterClassName"
        );
    }

    #[test]
    fn test_indices_are_dense() {
        for (i, kind) in CapabilityKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("rule".parse::<CapabilityKind>().unwrap(), CapabilityKind::Rule);
        assert_eq!(
            "NIWSServerListClassName".parse::<CapabilityKind>().unwrap(),
            CapabilityKind::ServerListProvider
        );
        let err = "balancer".parse::<CapabilityKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown capability kind 'balancer'");
    }

    #[test]
    fn test_from_property_name() {
        assert_eq!(
            CapabilityKind::from_property_name("NFLoadBalancerPingClassName"),
            Some(CapabilityKind::HealthCheck)
        );
        assert_eq!(CapabilityKind::from_property_name("listOfServers"), None);
    }
}
