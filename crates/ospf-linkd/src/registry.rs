//! Topology registry abstraction.
//!
//! The registry holds the devices the control platform already knows and the
//! ports each one has, annotated with addresses by port discovery. Link
//! discovery only reads from it; lookups are synchronous and never retried.

use parking_lot::RwLock;
use std::collections::HashMap;
use topo_types::{annotation_keys, DeviceId, PortDescription, PortNumber};

use crate::config_file::InventoryDevice;

/// Read-only view of known devices and their ports.
#[cfg_attr(test, mockall::automock)]
pub trait TopologyRegistry: Send + Sync {
    /// Returns the registered identity matching `candidate`, if any.
    fn find_device(&self, candidate: &DeviceId) -> Option<DeviceId>;

    /// Returns the ports of `device` in registry order (empty if unknown).
    fn list_ports(&self, device: &DeviceId) -> Vec<PortDescription>;
}

/// Registry kept in process memory.
///
/// Devices must be registered explicitly; port updates for an unknown device
/// are ignored rather than creating it.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    devices: RwLock<HashMap<DeviceId, Vec<PortDescription>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry seeded from the static inventory.
    pub fn from_inventory(inventory: &[InventoryDevice]) -> Self {
        let registry = Self::new();
        for device in inventory {
            let ports = device
                .ports
                .iter()
                .map(|port| {
                    let mut desc = PortDescription::new(PortNumber::new(port.number), true);
                    if let Some(name) = &port.name {
                        desc = desc.with_annotation(annotation_keys::PORT_NAME, name);
                    }
                    if let Some(mac) = &port.mac {
                        desc = desc.with_annotation(annotation_keys::PORT_MAC, mac);
                    }
                    if let Some(ip) = &port.ip {
                        desc = desc.with_annotation(annotation_keys::PORT_IP, ip);
                    }
                    desc
                })
                .collect();
            registry.register_device(device.id.clone(), ports);
        }
        registry
    }

    /// Registers (or replaces) a device with its ports.
    pub fn register_device(&self, device: DeviceId, ports: Vec<PortDescription>) {
        self.devices.write().insert(device, ports);
    }

    /// Replaces the port list of a registered device.
    ///
    /// Returns false, leaving the registry unchanged, if the device is unknown.
    pub fn update_ports(&self, device: &DeviceId, ports: Vec<PortDescription>) -> bool {
        match self.devices.write().get_mut(device) {
            Some(existing) => {
                *existing = ports;
                true
            }
            None => false,
        }
    }

    pub fn remove_device(&self, device: &DeviceId) -> bool {
        self.devices.write().remove(device).is_some()
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}

impl TopologyRegistry for InMemoryRegistry {
    fn find_device(&self, candidate: &DeviceId) -> Option<DeviceId> {
        self.devices
            .read()
            .get_key_value(candidate)
            .map(|(id, _)| id.clone())
    }

    fn list_ports(&self, device: &DeviceId) -> Vec<PortDescription> {
        self.devices.read().get(device).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_file::InventoryPort;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> DeviceId {
        s.parse().unwrap()
    }

    #[test]
    fn test_find_device() {
        let registry = InMemoryRegistry::new();
        registry.register_device(id("netconf:192.168.0.4:22"), vec![]);

        assert_eq!(
            registry.find_device(&id("netconf:192.168.0.4:22")),
            Some(id("netconf:192.168.0.4:22"))
        );
        assert_eq!(registry.find_device(&id("netconf:192.168.0.4:830")), None);
    }

    #[test]
    fn test_list_ports_unknown_device_is_empty() {
        let registry = InMemoryRegistry::new();
        assert!(registry.list_ports(&id("netconf:10.0.0.1:22")).is_empty());
    }

    #[test]
    fn test_update_ports_never_creates_device() {
        let registry = InMemoryRegistry::new();
        let ports = vec![PortDescription::new(PortNumber::new(1), true)];
        assert!(!registry.update_ports(&id("netconf:10.0.0.1:22"), ports.clone()));
        assert!(registry.is_empty());

        registry.register_device(id("netconf:10.0.0.1:22"), vec![]);
        assert!(registry.update_ports(&id("netconf:10.0.0.1:22"), ports.clone()));
        assert_eq!(registry.list_ports(&id("netconf:10.0.0.1:22")), ports);

        assert!(registry.remove_device(&id("netconf:10.0.0.1:22")));
        assert!(!registry.remove_device(&id("netconf:10.0.0.1:22")));
    }

    #[test]
    fn test_from_inventory() {
        let inventory = vec![InventoryDevice {
            id: id("netconf:192.168.0.4:22"),
            ports: vec![
                InventoryPort {
                    number: 1,
                    name: Some("GigabitEthernet1".to_string()),
                    mac: None,
                    ip: Some("192.168.0.4/24".to_string()),
                },
                InventoryPort {
                    number: 3,
                    name: None,
                    mac: Some("2cc2.6058.f7d7".to_string()),
                    ip: Some("10.100.4.4/24".to_string()),
                },
            ],
        }];

        let registry = InMemoryRegistry::from_inventory(&inventory);
        assert_eq!(registry.len(), 1);

        let ports = registry.list_ports(&id("netconf:192.168.0.4:22"));
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].number, PortNumber::new(1));
        assert_eq!(
            ports[0].annotation(annotation_keys::PORT_NAME),
            Some("GigabitEthernet1")
        );
        assert_eq!(ports[1].ip_annotation(), Some("10.100.4.4/24"));
        assert_eq!(
            ports[1].annotation(annotation_keys::PORT_MAC),
            Some("2cc2.6058.f7d7")
        );
    }
}
