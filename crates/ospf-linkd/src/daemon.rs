//! Daemon wiring: builds the collaborators from configuration and runs polls
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AU-12: Audit Record Generation - Link changes logged per poll
//! - CM-6: Configuration Settings - Everything is derived from the TOML config
//! - SI-4: System Monitoring - Periodic neighbor-table polling

use std::sync::Arc;
use std::time::Duration;
use topo_types::{DeviceId, LinkSet};
use tracing::{info, instrument, warn};

use crate::config_file::{LinkdConfig, ReplyFormat};
use crate::error::Result;
use crate::link_discovery::{poll_with_timeout, LinkDiscovery};
use crate::port_discovery::PortDiscovery;
use crate::registry::{InMemoryRegistry, TopologyRegistry};
use crate::response::{NetconfReplyParser, PlainTextParser, ResponseParser};
use crate::session::{DeviceSession, ShellSession};

/// Picks the reply parser for a configured envelope format.
pub fn parser_for(format: ReplyFormat) -> Arc<dyn ResponseParser> {
    match format {
        ReplyFormat::Plain => Arc::new(PlainTextParser),
        ReplyFormat::Netconf => Arc::new(NetconfReplyParser),
    }
}

/// Long-lived state of one ospf-linkd instance.
pub struct LinkDaemon {
    registry: Arc<InMemoryRegistry>,
    links: LinkDiscovery,
    ports: PortDiscovery,
    poll_timeout: Duration,
    last_links: LinkSet,
}

impl LinkDaemon {
    /// Builds a daemon that talks to the device through shell commands.
    pub fn from_config(config: &LinkdConfig) -> Result<Self> {
        let session = Arc::new(ShellSession::new(
            config.session.neighbor_command.clone(),
            config.session.interface_command.clone(),
        ));
        Self::with_session(config, session)
    }

    /// Builds a daemon around an existing session.
    pub fn with_session(config: &LinkdConfig, session: Arc<dyn DeviceSession>) -> Result<Self> {
        config.validate()?;
        let local_device = config.local_device()?;

        let registry = Arc::new(InMemoryRegistry::from_inventory(&config.inventory));
        if registry.find_device(&local_device).is_none() {
            registry.register_device(local_device.clone(), Vec::new());
        }
        info!(
            devices = registry.len(),
            local_device = %local_device,
            "Seeded topology registry from inventory"
        );

        let parser = parser_for(config.session.reply_format);
        let links = LinkDiscovery::new(
            local_device.clone(),
            session.clone(),
            parser.clone(),
            registry.clone(),
            config.discovery.clone(),
        );
        let ports = PortDiscovery::new(local_device, session, parser);

        Ok(Self {
            registry,
            links,
            ports,
            poll_timeout: config.poll_timeout(),
            last_links: LinkSet::new(),
        })
    }

    pub fn local_device(&self) -> &DeviceId {
        self.links.local_device()
    }

    pub fn registry(&self) -> &Arc<InMemoryRegistry> {
        &self.registry
    }

    /// Links reported by the last successful poll.
    pub fn last_links(&self) -> &LinkSet {
        &self.last_links
    }

    /// Scrapes the local device's ports and stores them in the registry.
    #[instrument(skip(self), fields(device = %self.local_device()))]
    pub async fn refresh_local_ports(&self) -> Result<usize> {
        let ports = self.ports.discover_ports().await?;
        let count = ports.len();
        self.registry.update_ports(self.local_device(), ports);
        Ok(count)
    }

    /// Runs one bounded poll and logs what changed since the previous one.
    ///
    /// A failed poll leaves the previous result in place.
    pub async fn poll_once(&mut self) -> Result<&LinkSet> {
        let links = poll_with_timeout(&self.links, self.poll_timeout).await?;

        let diff = links.diff(&self.last_links);
        for link in &diff.added {
            info!(link = %link, "ospf-linkd: Link appeared");
        }
        for link in &diff.removed {
            warn!(link = %link, "ospf-linkd: Link disappeared");
        }

        match serde_json::to_string(&links) {
            Ok(json) => info!(links = %json, count = links.len(), "ospf-linkd: Current links"),
            Err(e) => warn!(error = %e, "ospf-linkd: Failed to serialize link set"),
        }

        self.last_links = links;
        Ok(&self.last_links)
    }
}
