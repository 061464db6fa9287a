//! Configuration file support for ospf-linkd
//!
//! Loads and validates ospf-linkd configuration from TOML files.
//! Default location: /etc/sonic/ospf-linkd.conf
//!
//! The neighbor command must print the Cisco IOS layout of
//! `show ip ospf neighbor`: six columns per adjacency and an upper-case
//! `FULL` state. FRR's `vtysh` prints extra columns (`Up Time`, `RXmtL`,
//! ...), so its rows are rejected as malformed. The defaults therefore
//! reach an IOS device over SSH; replace the host in `neighbor_command`
//! and `interface_command`, or point them at any source that emits the
//! IOS layout.
//!
//! ```toml
//! [local]
//! device_id = "netconf:192.168.0.1:22"
//!
//! [session]
//! neighbor_command = "ssh admin@192.168.0.1 'show ip ospf neighbor | include Ethernet'"
//! poll_interval_secs = 30
//!
//! [discovery]
//! unresolved_port_policy = "drop"
//!
//! [[discovery.transports]]
//! scheme = "netconf"
//! port = 830
//!
//! [[inventory]]
//! id = "netconf:192.168.0.4:22"
//! ports = [{ number = 3, name = "GigabitEthernet3", ip = "10.100.4.4/24" }]
//! ```

use crate::error::{DiscoveryError, Result};
use crate::identity::{default_transports, TransportConvention};
use crate::link_discovery::UnresolvedPortPolicy;
use crate::neighbor::FULL_ADJACENCY_MARKER;
use crate::session::{INTERFACE_EXEC_COMMAND, NEIGHBOR_EXEC_COMMAND};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use topo_types::DeviceId;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sonic/ospf-linkd.conf";

/// Identity of the device whose neighbor table is polled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Device identifier URI, e.g. `netconf:192.168.0.1:22`
    #[serde(default = "default_local_device_id")]
    pub device_id: String,
}

/// How the reply text is wrapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplyFormat {
    /// Bare CLI output
    #[default]
    Plain,
    /// NETCONF `<rpc-reply>` envelope
    Netconf,
}

/// Session and polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Shell command printing the neighbor table in the IOS layout
    #[serde(default = "default_neighbor_command")]
    pub neighbor_command: String,

    /// Shell command producing the interface listing
    #[serde(default = "default_interface_command")]
    pub interface_command: String,

    /// Envelope format of both commands' output
    #[serde(default)]
    pub reply_format: ReplyFormat,

    /// Seconds between polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Upper bound for one poll in seconds
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Scrape the local device's ports into the registry at startup
    #[serde(default = "default_scrape_local_ports")]
    pub scrape_local_ports: bool,
}

/// Link assembly configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Substring of the state column marking a full adjacency
    #[serde(default = "default_adjacency_marker")]
    pub adjacency_marker: String,

    /// Interface name prefix stripped to get the local port number
    #[serde(default = "default_local_interface_prefix")]
    pub local_interface_prefix: String,

    /// Handling of adjacencies whose remote port is unknown
    #[serde(default)]
    pub unresolved_port_policy: UnresolvedPortPolicy,

    /// Candidate identity conventions, in lookup order
    #[serde(default = "default_transports")]
    pub transports: Vec<TransportConvention>,
}

/// One port of a statically known device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryPort {
    pub number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    /// Address with prefix length, e.g. `10.100.4.4/24`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// A statically known device, seeded into the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDevice {
    pub id: DeviceId,
    #[serde(default)]
    pub ports: Vec<InventoryPort>,
}

/// Complete ospf-linkd configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkdConfig {
    #[serde(default)]
    pub local: LocalConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub inventory: Vec<InventoryDevice>,
}

// Default functions
fn default_local_device_id() -> String {
    "netconf:127.0.0.1:22".to_string()
}

fn default_neighbor_command() -> String {
    format!("ssh 127.0.0.1 '{}'", NEIGHBOR_EXEC_COMMAND)
}

fn default_interface_command() -> String {
    format!("ssh 127.0.0.1 '{}'", INTERFACE_EXEC_COMMAND)
}

fn default_poll_interval() -> u64 {
    30
}

fn default_poll_timeout() -> u64 {
    10
}

fn default_scrape_local_ports() -> bool {
    false
}

fn default_adjacency_marker() -> String {
    FULL_ADJACENCY_MARKER.to_string()
}

fn default_local_interface_prefix() -> String {
    "GigabitEthernet".to_string()
}

// Default implementations
impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            device_id: default_local_device_id(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            neighbor_command: default_neighbor_command(),
            interface_command: default_interface_command(),
            reply_format: ReplyFormat::default(),
            poll_interval_secs: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
            scrape_local_ports: default_scrape_local_ports(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            adjacency_marker: default_adjacency_marker(),
            local_interface_prefix: default_local_interface_prefix(),
            unresolved_port_policy: UnresolvedPortPolicy::default(),
            transports: default_transports(),
        }
    }
}

impl LinkdConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config = toml::from_str(&content).map_err(|e| {
                    DiscoveryError::Config(format!(
                        "Failed to parse config file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                eprintln!(
                    "ospf-linkd: Config file {} not found, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(DiscoveryError::Io(e)),
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| {
            DiscoveryError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content).map_err(DiscoveryError::Io)?;

        Ok(())
    }

    /// Parsed identity of the local device
    pub fn local_device(&self) -> Result<DeviceId> {
        self.local.device_id.parse().map_err(|e| {
            DiscoveryError::Config(format!(
                "invalid local device_id '{}': {}",
                self.local.device_id, e
            ))
        })
    }

    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.session.poll_interval_secs)
    }

    /// Get poll timeout as Duration
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.session.poll_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.local.device_id.trim().is_empty() {
            return Err(DiscoveryError::Config(
                "local device_id must not be empty".to_string(),
            ));
        }
        self.local_device()?;

        if self.session.poll_interval_secs == 0 {
            return Err(DiscoveryError::Config(
                "poll_interval_secs must be > 0".to_string(),
            ));
        }

        if self.session.poll_timeout_secs == 0 {
            return Err(DiscoveryError::Config(
                "poll_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.discovery.adjacency_marker.is_empty() {
            return Err(DiscoveryError::Config(
                "adjacency_marker must not be empty".to_string(),
            ));
        }

        if self.discovery.transports.is_empty() {
            return Err(DiscoveryError::Config(
                "at least one transport convention is required".to_string(),
            ));
        }

        for transport in &self.discovery.transports {
            if !DeviceId::is_valid_scheme(&transport.scheme) {
                return Err(DiscoveryError::Config(format!(
                    "invalid transport scheme '{}'",
                    transport.scheme
                )));
            }
            if transport.port == 0 {
                return Err(DiscoveryError::Config(format!(
                    "transport '{}' port must be > 0",
                    transport.scheme
                )));
            }
        }

        Ok(())
    }
}
