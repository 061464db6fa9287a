//! Port discovery from `show interfaces` output.
//!
//! Port resolution matches neighbor addresses against the `portIp`
//! annotation of registered ports. This module produces those annotations
//! by scraping the filtered interface listing, four lines per interface:
//!
//! ```text
//! GigabitEthernet1 is up, line protocol is up
//!   Hardware is CSR vNIC, address is 2cc2.6058.f7d5 (bia 2cc2.6058.f7d5)
//!   Internet address is 192.168.0.4/24
//!   MTU 1500 bytes, BW 1000000 Kbit/sec, DLY 10 usec,
//! ```
//!
//! Ports are numbered from 1 in listing order.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use topo_types::{
    annotation_keys, DeviceId, InterfaceAddress, MacAddress, PortDescription, PortNumber,
    PortType,
};
use tracing::{debug, error, info, instrument};

use crate::error::{DiscoveryError, Result};
use crate::response::ResponseParser;
use crate::session::DeviceSession;

/// Lines per interface in the filtered listing.
pub const LINES_PER_INTERFACE: usize = 4;

static MAC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}").expect("Invalid regex pattern")
});

static IPV4_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}/\d{1,2}").expect("Invalid regex pattern")
});

static BANDWIDTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"BW (\d+) Kbit/sec").expect("Invalid regex pattern"));

/// Parses a filtered interface listing into port descriptions.
pub fn parse_interface_block(block: &str) -> Result<Vec<PortDescription>> {
    let lines: Vec<&str> = block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() % LINES_PER_INTERFACE != 0 {
        error!(
            lines = lines.len(),
            "Interface listing does not split into {} lines per interface", LINES_PER_INTERFACE
        );
        return Err(DiscoveryError::Response(format!(
            "interface listing has {} lines, expected a multiple of {}",
            lines.len(),
            LINES_PER_INTERFACE
        )));
    }

    Ok(lines
        .chunks_exact(LINES_PER_INTERFACE)
        .enumerate()
        .map(|(i, chunk)| parse_interface(PortNumber::new(i as u64 + 1), chunk))
        .collect())
}

fn parse_interface(number: PortNumber, chunk: &[&str]) -> PortDescription {
    let (status, hardware, internet, bandwidth) = (chunk[0], chunk[1], chunk[2], chunk[3]);

    let name = status.split_whitespace().next().unwrap_or_default();
    let enabled = line_protocol_up(status);
    let mac = parse_mac(hardware);
    let ip = parse_interface_address(internet);
    let speed_mbps = parse_speed_mbps(bandwidth);

    debug!(
        port = %number,
        name,
        enabled,
        mac = %mac,
        ip = %ip,
        speed_mbps,
        "Parsed interface"
    );

    PortDescription::new(number, enabled)
        .with_port_type(PortType::Copper)
        .with_speed_mbps(speed_mbps)
        .with_annotation(annotation_keys::PORT_NAME, name)
        .with_annotation(annotation_keys::PORT_MAC, mac.to_string())
        .with_annotation(annotation_keys::PORT_IP, ip.to_string())
}

/// Line protocol state; falls back to any `up` on the line if the status
/// line has no protocol clause.
fn line_protocol_up(status: &str) -> bool {
    match status.split_once("line protocol is") {
        Some((_, state)) => state.trim_start().starts_with("up"),
        None => status.contains("up"),
    }
}

/// First Cisco-dotted MAC on the line, or the zero MAC.
fn parse_mac(line: &str) -> MacAddress {
    MAC_RE
        .find(line)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(MacAddress::ZERO)
}

/// First `a.b.c.d/len` on the line, or `0.0.0.0/0`.
fn parse_interface_address(line: &str) -> InterfaceAddress {
    IPV4_PREFIX_RE
        .find(line)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(InterfaceAddress::UNSPECIFIED_V4)
}

fn parse_speed_mbps(line: &str) -> u64 {
    BANDWIDTH_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(|kbps| kbps / 1000)
        .unwrap_or(0)
}

/// Scrapes the ports of one device through a session.
pub struct PortDiscovery {
    device: DeviceId,
    session: Arc<dyn DeviceSession>,
    parser: Arc<dyn ResponseParser>,
}

impl PortDiscovery {
    pub fn new(
        device: DeviceId,
        session: Arc<dyn DeviceSession>,
        parser: Arc<dyn ResponseParser>,
    ) -> Self {
        Self {
            device,
            session,
            parser,
        }
    }

    #[instrument(skip(self), fields(device = %self.device))]
    pub async fn discover_ports(&self) -> Result<Vec<PortDescription>> {
        let reply = self.session.issue_interface_query(&self.device).await?;
        debug!(reply = %reply.replace('\r', ""), "Device replied");

        let block = self.parser.extract_block(&reply)?;
        let ports = parse_interface_block(&block.text)?;
        info!(ports = ports.len(), "Port discovery complete");
        Ok(ports)
    }
}
