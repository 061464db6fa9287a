//! Resolution of an OSPF router id to a registered device identity.
//!
//! Neighbor tables only carry a bare address. The same router may have been
//! onboarded under different transport conventions (NETCONF over port 22 or
//! 830, ...), each producing a different device identity, so resolution
//! tries an ordered list of candidate identities and takes the first one the
//! registry knows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use topo_types::DeviceId;
use tracing::{debug, warn};

use crate::registry::TopologyRegistry;

/// One way a device may have been onboarded: a URI scheme plus the
/// transport port it was reached on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransportConvention {
    pub scheme: String,
    pub port: u16,
}

impl TransportConvention {
    pub fn new(scheme: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            port,
        }
    }

    /// NETCONF reached over the SSH port.
    pub fn netconf_ssh() -> Self {
        Self::new("netconf", 22)
    }

    /// NETCONF over its IANA-assigned port.
    pub fn netconf_default() -> Self {
        Self::new("netconf", 830)
    }

    /// Identity the device at `host` would have under this convention.
    pub fn candidate(&self, host: &IpAddr) -> DeviceId {
        DeviceId::from_transport(&self.scheme, host, self.port)
    }
}

impl fmt::Display for TransportConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scheme, self.port)
    }
}

/// Lookup order used when nothing is configured.
pub fn default_transports() -> Vec<TransportConvention> {
    vec![
        TransportConvention::netconf_ssh(),
        TransportConvention::netconf_default(),
    ]
}

/// Maps router ids to device identities by ordered speculative probing.
#[derive(Debug, Clone)]
pub struct DeviceResolver {
    conventions: Vec<TransportConvention>,
}

impl Default for DeviceResolver {
    fn default() -> Self {
        Self::new(default_transports())
    }
}

impl DeviceResolver {
    pub fn new(conventions: Vec<TransportConvention>) -> Self {
        Self { conventions }
    }

    /// Candidate identities for `router_id`, in lookup order.
    ///
    /// Returns `None` if `router_id` is not an IP address.
    pub fn candidates(&self, router_id: &str) -> Option<Vec<DeviceId>> {
        let host: IpAddr = router_id.parse().ok()?;
        Some(self.conventions.iter().map(|c| c.candidate(&host)).collect())
    }

    /// Returns the first candidate identity the registry knows.
    ///
    /// Candidates after the first hit are never queried. A miss on every
    /// candidate is logged and reported as `None`; it is not an error.
    pub fn resolve(&self, registry: &dyn TopologyRegistry, router_id: &str) -> Option<DeviceId> {
        let Ok(host) = router_id.parse::<IpAddr>() else {
            warn!(router_id, "Router id is not an IP address, cannot resolve device");
            return None;
        };

        let found = self.conventions.iter().find_map(|convention| {
            let candidate = convention.candidate(&host);
            let hit = registry.find_device(&candidate);
            debug!(
                router_id,
                candidate = %candidate,
                hit = hit.is_some(),
                "Checked candidate device identity"
            );
            hit
        });

        if found.is_none() {
            warn!(
                router_id,
                candidates = self.conventions.len(),
                "Unable to resolve device for router id"
            );
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{InMemoryRegistry, MockTopologyRegistry};
    use mockall::predicate::eq;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> DeviceId {
        s.parse().unwrap()
    }

    #[test]
    fn test_candidates_in_priority_order() {
        let resolver = DeviceResolver::default();
        assert_eq!(
            resolver.candidates("192.168.0.4").unwrap(),
            vec![id("netconf:192.168.0.4:22"), id("netconf:192.168.0.4:830")]
        );
        assert!(resolver.candidates("not-an-ip").is_none());
    }

    #[test]
    fn test_resolve_first_priority() {
        let registry = InMemoryRegistry::new();
        registry.register_device(id("netconf:192.168.0.4:22"), vec![]);
        registry.register_device(id("netconf:192.168.0.4:830"), vec![]);

        let resolver = DeviceResolver::default();
        assert_eq!(
            resolver.resolve(&registry, "192.168.0.4"),
            Some(id("netconf:192.168.0.4:22"))
        );
    }

    #[test]
    fn test_resolve_second_priority_only() {
        let registry = InMemoryRegistry::new();
        registry.register_device(id("netconf:192.168.0.4:830"), vec![]);

        let resolver = DeviceResolver::default();
        assert_eq!(
            resolver.resolve(&registry, "192.168.0.4"),
            Some(id("netconf:192.168.0.4:830"))
        );
    }

    #[test]
    fn test_resolve_not_found() {
        let registry = InMemoryRegistry::new();
        registry.register_device(id("netconf:192.168.0.5:22"), vec![]);

        let resolver = DeviceResolver::default();
        assert_eq!(resolver.resolve(&registry, "192.168.0.4"), None);
        assert_eq!(resolver.resolve(&registry, "router-4"), None);
    }

    #[test]
    fn test_resolve_tries_in_order_and_stops_at_first_hit() {
        let mut registry = MockTopologyRegistry::new();
        let mut seq = Sequence::new();

        registry
            .expect_find_device()
            .with(eq(id("snmp:10.0.0.9:161")))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(None::<DeviceId>);
        registry
            .expect_find_device()
            .with(eq(id("netconf:10.0.0.9:22")))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(Some(id("netconf:10.0.0.9:22")));
        // third convention must never be queried
        registry
            .expect_find_device()
            .with(eq(id("netconf:10.0.0.9:830")))
            .times(0);

        let resolver = DeviceResolver::new(vec![
            TransportConvention::new("snmp", 161),
            TransportConvention::netconf_ssh(),
            TransportConvention::netconf_default(),
        ]);

        assert_eq!(
            resolver.resolve(&registry, "10.0.0.9"),
            Some(id("netconf:10.0.0.9:22"))
        );
    }

    #[test]
    fn test_resolve_ipv6_router_id() {
        let registry = InMemoryRegistry::new();
        registry.register_device(id("netconf:[2001:db8::4]:830"), vec![]);

        let resolver = DeviceResolver::default();
        assert_eq!(
            resolver.resolve(&registry, "2001:db8::4"),
            Some(id("netconf:[2001:db8::4]:830"))
        );
    }

    #[test]
    fn test_convention_display() {
        assert_eq!(TransportConvention::netconf_default().to_string(), "netconf/830");
    }
}
