//! Port number and port inventory types.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Well-known port annotation keys.
pub mod annotation_keys {
    /// Interface name as reported by the device (e.g. `GigabitEthernet1`).
    pub const PORT_NAME: &str = "portName";
    /// Interface MAC address.
    pub const PORT_MAC: &str = "portMac";
    /// Interface address with prefix length (e.g. `10.100.4.4/24`).
    pub const PORT_IP: &str = "portIp";
}

/// Number of a port on a device.
///
/// [`PortNumber::UNRESOLVED`] is a reserved value meaning the port could not
/// be determined; it never equals a port number a device reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortNumber(u64);

impl PortNumber {
    /// Sentinel for "port intentionally unknown".
    pub const UNRESOLVED: PortNumber = PortNumber(u64::MAX);

    pub const fn new(number: u64) -> Self {
        PortNumber(number)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns true unless this is the [`PortNumber::UNRESOLVED`] sentinel.
    pub const fn is_resolved(&self) -> bool {
        self.0 != u64::MAX
    }
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_resolved() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("UNRESOLVED")
        }
    }
}

impl FromStr for PortNumber {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("unresolved") {
            return Ok(PortNumber::UNRESOLVED);
        }
        s.parse::<u64>()
            .map(PortNumber)
            .map_err(|_| ParseError::InvalidPortNumber(s.to_string()))
    }
}

/// Physical medium of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    #[default]
    Copper,
    Fiber,
    Virtual,
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortType::Copper => "copper",
            PortType::Fiber => "fiber",
            PortType::Virtual => "virtual",
        };
        write!(f, "{}", s)
    }
}

/// A port as held by the topology registry.
///
/// Address and naming details are carried as string annotations keyed by
/// [`annotation_keys`], the way independent port discovery publishes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDescription {
    pub number: PortNumber,
    pub enabled: bool,
    #[serde(default)]
    pub port_type: PortType,
    /// Port speed in Mbps.
    #[serde(default)]
    pub speed_mbps: u64,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl PortDescription {
    pub fn new(number: PortNumber, enabled: bool) -> Self {
        Self {
            number,
            enabled,
            port_type: PortType::default(),
            speed_mbps: 0,
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_port_type(mut self, port_type: PortType) -> Self {
        self.port_type = port_type;
        self
    }

    pub fn with_speed_mbps(mut self, speed_mbps: u64) -> Self {
        self.speed_mbps = speed_mbps;
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Gets the value of an annotation, if present.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Shorthand for the [`annotation_keys::PORT_IP`] annotation.
    pub fn ip_annotation(&self) -> Option<&str> {
        self.annotation(annotation_keys::PORT_IP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_port_number_sentinel() {
        assert!(PortNumber::new(3).is_resolved());
        assert!(!PortNumber::UNRESOLVED.is_resolved());
        assert_ne!(PortNumber::new(0), PortNumber::UNRESOLVED);
    }

    #[test]
    fn test_port_number_display_and_parse() {
        assert_eq!(PortNumber::new(4).to_string(), "4");
        assert_eq!(PortNumber::UNRESOLVED.to_string(), "UNRESOLVED");
        assert_eq!("4".parse::<PortNumber>().unwrap(), PortNumber::new(4));
        assert_eq!(
            "UNRESOLVED".parse::<PortNumber>().unwrap(),
            PortNumber::UNRESOLVED
        );
        assert!("four".parse::<PortNumber>().is_err());
    }

    #[test]
    fn test_port_description_annotations() {
        let port = PortDescription::new(PortNumber::new(3), true)
            .with_speed_mbps(1000)
            .with_annotation(annotation_keys::PORT_NAME, "GigabitEthernet3")
            .with_annotation(annotation_keys::PORT_IP, "10.100.4.4/24");

        assert_eq!(port.ip_annotation(), Some("10.100.4.4/24"));
        assert_eq!(
            port.annotation(annotation_keys::PORT_NAME),
            Some("GigabitEthernet3")
        );
        assert_eq!(port.annotation(annotation_keys::PORT_MAC), None);
        assert_eq!(port.port_type, PortType::Copper);
    }
}
