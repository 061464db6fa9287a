//! LinkDiscovery - Assembles link descriptions from one neighbor-table poll
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-8: System Component Inventory - Discovered links describe the network
//! - SI-4: System Monitoring - Each poll reports what it skipped and why
//! - SI-11: Error Handling - Row failures are contained to the row
//!
//! # Pipeline
//!
//! ```text
//! session reply ─▶ response block ─▶ rows ─▶ FULL filter ─▶ local port
//!                                                         ─▶ remote device (ordered lookup)
//!                                                         ─▶ remote port (address match)
//!                                                         ─▶ LinkSet
//! ```
//!
//! Every poll starts from an empty [`LinkSet`] and returns it whole; nothing
//! is carried over between polls.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use topo_types::{ConnectPoint, DeviceId, LinkDescription, LinkSet, LinkType, PortNumber};
use tracing::{debug, info, instrument, warn};

use crate::config_file::DiscoveryConfig;
use crate::error::{DiscoveryError, Result, RowError};
use crate::identity::DeviceResolver;
use crate::neighbor::{parse_neighbor_rows, NeighborRow};
use crate::port_resolver::resolve_port;
use crate::registry::TopologyRegistry;
use crate::response::ResponseParser;
use crate::session::DeviceSession;

/// What to do with an adjacency whose remote port cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedPortPolicy {
    /// Emit the link with [`PortNumber::UNRESOLVED`] as the remote port.
    #[default]
    KeepWithSentinel,
    /// Drop the adjacency, as for an unresolved device.
    Drop,
}

/// Per-poll counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollSummary {
    /// Non-blank lines seen.
    pub rows: usize,
    /// Lines with the wrong column count.
    pub malformed: usize,
    /// Well-formed rows whose adjacency is not fully established.
    pub not_full: usize,
    /// Rows whose local interface has no port number.
    pub bad_local_port: usize,
    /// Rows whose router id matched no registered device.
    pub identity_misses: usize,
    /// Rows whose neighbor address matched no port.
    pub port_misses: usize,
    /// Distinct links in the result.
    pub links: usize,
}

/// Derives the local port number from an interface name such as
/// `GigabitEthernet4` by stripping `prefix` and parsing the decimal rest.
pub fn local_port_number(interface: &str, prefix: &str) -> std::result::Result<PortNumber, RowError> {
    let err = || RowError::LocalPort {
        interface: interface.to_string(),
        prefix: prefix.to_string(),
    };

    let suffix = interface.strip_prefix(prefix).ok_or_else(err)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }
    let port = PortNumber::new(suffix.parse::<u64>().map_err(|_| err())?);
    if !port.is_resolved() {
        return Err(err());
    }
    Ok(port)
}

/// Link discovery for one local device.
pub struct LinkDiscovery {
    local_device: DeviceId,
    session: Arc<dyn DeviceSession>,
    parser: Arc<dyn ResponseParser>,
    registry: Arc<dyn TopologyRegistry>,
    resolver: DeviceResolver,
    config: DiscoveryConfig,
}

impl LinkDiscovery {
    pub fn new(
        local_device: DeviceId,
        session: Arc<dyn DeviceSession>,
        parser: Arc<dyn ResponseParser>,
        registry: Arc<dyn TopologyRegistry>,
        config: DiscoveryConfig,
    ) -> Self {
        let resolver = DeviceResolver::new(config.transports.clone());
        Self {
            local_device,
            session,
            parser,
            registry,
            resolver,
            config,
        }
    }

    pub fn local_device(&self) -> &DeviceId {
        &self.local_device
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Polls the device once and returns the links it currently reports.
    ///
    /// Session and envelope failures abort the poll; row-level failures only
    /// drop the row.
    #[instrument(skip(self), fields(device = %self.local_device))]
    pub async fn discover_links(&self) -> Result<LinkSet> {
        let reply = self
            .session
            .issue_neighbor_query(&self.local_device)
            .await?;
        debug!(reply = %reply.replace('\r', ""), "Device replied");

        let block = self.parser.extract_neighbor_block(&reply)?;
        if block.is_anomalous() {
            warn!(
                sections = block.section_count,
                "Reply carried more than one response section, using the first"
            );
        }

        let (links, summary) = self.assemble_links_with_summary(&block.text);
        info!(
            rows = summary.rows,
            malformed = summary.malformed,
            not_full = summary.not_full,
            bad_local_port = summary.bad_local_port,
            identity_misses = summary.identity_misses,
            port_misses = summary.port_misses,
            links = summary.links,
            "Link discovery poll complete"
        );
        Ok(links)
    }

    /// Runs the parse/filter/resolve pipeline over a neighbor-table block.
    pub fn assemble_links(&self, block: &str) -> LinkSet {
        self.assemble_links_with_summary(block).0
    }

    pub fn assemble_links_with_summary(&self, block: &str) -> (LinkSet, PollSummary) {
        let mut links = LinkSet::new();
        let mut summary = PollSummary::default();

        for parsed in parse_neighbor_rows(block) {
            summary.rows += 1;

            let row = match parsed {
                Ok(row) => row,
                Err(e) => {
                    summary.malformed += 1;
                    warn!(error = %e, "Skipping malformed neighbor row");
                    continue;
                }
            };
            debug!(router_id = %row.router_id, state = %row.state, "OSPF neighbor");

            if !row.is_full_adjacency(&self.config.adjacency_marker) {
                summary.not_full += 1;
                continue;
            }

            match self.link_for_row(&row, &mut summary) {
                Some(link) => {
                    debug!(link = %link, "Discovered link");
                    links.insert(link);
                }
                None => continue,
            }
        }

        summary.links = links.len();
        (links, summary)
    }

    /// Resolves both endpoints of a fully established adjacency.
    fn link_for_row(&self, row: &NeighborRow, summary: &mut PollSummary) -> Option<LinkDescription> {
        let local_port = match local_port_number(&row.interface, &self.config.local_interface_prefix)
        {
            Ok(port) => port,
            Err(e) => {
                summary.bad_local_port += 1;
                warn!(error = %e, router_id = %row.router_id, "Skipping neighbor row");
                return None;
            }
        };

        let Some(remote_device) = self.resolver.resolve(self.registry.as_ref(), &row.router_id)
        else {
            summary.identity_misses += 1;
            return None;
        };

        let remote_port = resolve_port(
            self.registry.as_ref(),
            &remote_device,
            &row.address,
            &row.router_id,
        );
        if !remote_port.is_resolved() {
            summary.port_misses += 1;
            if self.config.unresolved_port_policy == UnresolvedPortPolicy::Drop {
                return None;
            }
        }

        Some(LinkDescription::new(
            ConnectPoint::new(self.local_device.clone(), local_port),
            ConnectPoint::new(remote_device, remote_port),
            LinkType::Direct,
        ))
    }
}

/// Runs one poll bounded by `timeout`.
///
/// Resolution work is not cancellable mid-row, so the bound applies to the
/// poll as a whole; an expired poll returns no links at all.
pub async fn poll_with_timeout(discovery: &LinkDiscovery, timeout: Duration) -> Result<LinkSet> {
    match tokio::time::timeout(timeout, discovery.discover_links()).await {
        Ok(result) => result,
        Err(_) => Err(DiscoveryError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryRegistry;
    use crate::response::PlainTextParser;
    use crate::session::StaticSession;
    use pretty_assertions::assert_eq;
    use topo_types::{annotation_keys, PortDescription};

    const FULL_ROW: &str =
        "192.168.0.4       1   FULL/DR         00:00:31    10.100.4.4      GigabitEthernet4";

    fn id(s: &str) -> DeviceId {
        s.parse().unwrap()
    }

    fn registry() -> Arc<InMemoryRegistry> {
        let registry = InMemoryRegistry::new();
        registry.register_device(
            id("netconf:192.168.0.4:22"),
            vec![
                PortDescription::new(PortNumber::new(1), true)
                    .with_annotation(annotation_keys::PORT_IP, "192.168.0.4/24"),
                PortDescription::new(PortNumber::new(3), true)
                    .with_annotation(annotation_keys::PORT_IP, "10.100.4.4/24"),
            ],
        );
        Arc::new(registry)
    }

    fn discovery(reply: &str, config: DiscoveryConfig) -> LinkDiscovery {
        LinkDiscovery::new(
            id("netconf:192.168.0.1:22"),
            Arc::new(StaticSession::new(reply)),
            Arc::new(PlainTextParser),
            registry(),
            config,
        )
    }

    #[test]
    fn test_local_port_number() {
        assert_eq!(
            local_port_number("GigabitEthernet4", "GigabitEthernet").unwrap(),
            PortNumber::new(4)
        );
        assert_eq!(
            local_port_number("GigabitEthernet12", "GigabitEthernet").unwrap(),
            PortNumber::new(12)
        );
        assert!(local_port_number("GigabitEthernet", "GigabitEthernet").is_err());
        assert!(local_port_number("GigabitEthernet4.100", "GigabitEthernet").is_err());
        assert!(local_port_number("Loopback0", "GigabitEthernet").is_err());
        assert!(local_port_number("GigabitEthernet+4", "GigabitEthernet").is_err());
        assert!(local_port_number("GigabitEthernet18446744073709551615", "GigabitEthernet").is_err());
    }

    #[test]
    fn test_assemble_full_row() {
        let discovery = discovery("", DiscoveryConfig::default());
        let (links, summary) = discovery.assemble_links_with_summary(FULL_ROW);

        let expected = LinkDescription::new(
            ConnectPoint::new(id("netconf:192.168.0.1:22"), PortNumber::new(4)),
            ConnectPoint::new(id("netconf:192.168.0.4:22"), PortNumber::new(3)),
            LinkType::Direct,
        );
        assert_eq!(links.to_sorted_vec(), vec![expected]);
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.links, 1);
    }

    #[test]
    fn test_duplicate_rows_collapse() {
        let discovery = discovery("", DiscoveryConfig::default());
        let block = format!("{}\n{}\n", FULL_ROW, FULL_ROW);
        let (links, summary) = discovery.assemble_links_with_summary(&block);
        assert_eq!(links.len(), 1);
        assert_eq!(summary.rows, 2);
    }

    #[test]
    fn test_unresolved_port_policy() {
        let row = "192.168.0.4 1 FULL/BDR 00:00:31 10.200.9.9 GigabitEthernet2";

        let keep = discovery("", DiscoveryConfig::default());
        let (links, summary) = keep.assemble_links_with_summary(row);
        let link = links.iter().next().unwrap();
        assert_eq!(link.dst.port, PortNumber::UNRESOLVED);
        assert_eq!(link.src.port, PortNumber::new(2));
        assert_eq!(summary.port_misses, 1);

        let config = DiscoveryConfig {
            unresolved_port_policy: UnresolvedPortPolicy::Drop,
            ..DiscoveryConfig::default()
        };
        let drop = discovery("", config);
        let (links, summary) = drop.assemble_links_with_summary(row);
        assert!(links.is_empty());
        assert_eq!(summary.port_misses, 1);
    }

    #[test]
    fn test_row_failures_are_counted() {
        let block = "\
192.168.0.3 1 DOWN 00:00:00 10.100.2.3 GigabitEthernet3
192.168.0.4 1 FULL/DR 00:00:31 10.100.4.4
192.168.0.4 1 FULL/DR 00:00:31 10.100.4.4 Loopback0
192.168.0.9 1 FULL/DR 00:00:31 10.100.9.9 GigabitEthernet5
";
        let discovery = discovery("", DiscoveryConfig::default());
        let (links, summary) = discovery.assemble_links_with_summary(block);
        assert!(links.is_empty());
        assert_eq!(
            summary,
            PollSummary {
                rows: 4,
                malformed: 1,
                not_full: 1,
                bad_local_port: 1,
                identity_misses: 1,
                port_misses: 0,
                links: 0,
            }
        );
    }

    #[test]
    fn test_custom_marker_and_prefix() {
        let config = DiscoveryConfig {
            adjacency_marker: "Full".to_string(),
            local_interface_prefix: "Ethernet".to_string(),
            ..DiscoveryConfig::default()
        };
        let discovery = discovery("", config);
        let links =
            discovery.assemble_links("192.168.0.4 1 Full/DR 00:00:31 10.100.4.4 Ethernet8");
        assert_eq!(links.len(), 1);
        assert_eq!(links.iter().next().unwrap().src.port, PortNumber::new(8));
    }

    #[tokio::test]
    async fn test_discover_links_through_session() {
        let discovery = discovery(FULL_ROW, DiscoveryConfig::default());
        let links = discovery.discover_links().await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(discovery.local_device(), &id("netconf:192.168.0.1:22"));
    }

    #[tokio::test]
    async fn test_poll_with_timeout_ok() {
        let discovery = discovery(FULL_ROW, DiscoveryConfig::default());
        let links = poll_with_timeout(&discovery, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(links.len(), 1);
    }
}
