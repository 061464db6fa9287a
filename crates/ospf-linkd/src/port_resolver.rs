//! Resolution of a neighbor's interface address to a port on that neighbor.
//!
//! Relies on port discovery having annotated the neighbor's ports with their
//! addresses beforehand (see [`crate::port_discovery`]).

use topo_types::{DeviceId, PortNumber};
use tracing::{debug, warn};

use crate::registry::TopologyRegistry;

/// Returns the first port of `device` whose address annotation contains
/// `address`, or [`PortNumber::UNRESOLVED`].
///
/// Annotations carry a prefix length (`10.100.4.4/24`), hence containment
/// rather than equality. `router_id` is only used for the diagnostic.
pub fn resolve_port(
    registry: &dyn TopologyRegistry,
    device: &DeviceId,
    address: &str,
    router_id: &str,
) -> PortNumber {
    for port in registry.list_ports(device) {
        let annotation = port.ip_annotation();
        debug!(
            device = %device,
            port = %port.number,
            ip = annotation.unwrap_or("-"),
            "Inspecting port address"
        );
        if annotation.is_some_and(|ip| ip.contains(address)) {
            return port.number;
        }
    }

    warn!(
        address,
        router_id,
        device = %device,
        "Cannot resolve port number of neighbor address"
    );
    PortNumber::UNRESOLVED
}
