//! OSPF Link Discovery Daemon for SONiC
//!
//! This crate derives point-to-point links from a router's OSPF neighbor
//! table. Each fully established adjacency becomes a directed link from a
//! local port to a port on the neighboring device, provided the neighbor is
//! already registered in the topology registry.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//!
//! This module implements the following security controls:
//!
//! | Control | Description | Implementation |
//! |---------|-------------|----------------|
//! | AU-3 | Content of Audit Records | Structured logging with router ids and ports |
//! | AU-12 | Audit Record Generation | Link appearance and disappearance logged |
//! | CM-6 | Configuration Settings | TOML configuration with validation |
//! | CM-8 | System Component Inventory | Links and ports describe the network |
//! | IA-3 | Device Identification | Ordered device identity resolution |
//! | SI-4 | System Monitoring | Periodic neighbor-table polling |
//! | SI-10 | Input Validation | Malformed rows rejected per row |
//! | SI-11 | Error Handling | Structured error types |
//!
//! # Architecture
//!
//! ```text
//! +-----------------+     +----------------------+     +-------------------+
//! |  Router (CLI /  |     |      ospf-linkd      |     | Topology registry |
//! |  NETCONF)       |     |                      |     |                   |
//! |                 |     |  DeviceSession       |     |  devices          |
//! |  show ip ospf   |---->|       |              |     |  ports (portIp)   |
//! |  neighbor       |     |       v              |     |                   |
//! |                 |     |  ResponseParser      |     +-------------------+
//! |  show           |     |       |              |               ^
//! |  interfaces     |     |       v              |               |
//! +-----------------+     |  rows -> FULL filter |  lookups      |
//!                         |       |              |---------------+
//!                         |       v              |
//!                         |  DeviceResolver      |
//!                         |  resolve_port        |
//!                         |       |              |
//!                         |       v              |
//!                         |  LinkSet             |
//!                         +----------------------+
//! ```

pub mod config_file;
pub mod daemon;
pub mod error;
pub mod identity;
pub mod link_discovery;
pub mod neighbor;
pub mod port_discovery;
pub mod port_resolver;
pub mod registry;
pub mod response;
pub mod session;

pub use config_file::{DiscoveryConfig, LinkdConfig, ReplyFormat};
pub use daemon::LinkDaemon;
pub use error::{DiscoveryError, Result, RowError, SessionError};
pub use identity::{DeviceResolver, TransportConvention};
pub use link_discovery::{
    local_port_number, poll_with_timeout, LinkDiscovery, PollSummary, UnresolvedPortPolicy,
};
pub use neighbor::{parse_neighbor_rows, NeighborRow};
pub use port_discovery::{parse_interface_block, PortDiscovery};
pub use port_resolver::resolve_port;
pub use registry::{InMemoryRegistry, TopologyRegistry};
pub use response::{NetconfReplyParser, PlainTextParser, ResponseBlock, ResponseParser};
pub use session::{DeviceSession, ShellSession, StaticSession};
