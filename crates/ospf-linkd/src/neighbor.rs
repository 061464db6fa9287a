//! OSPF neighbor-table rows and the adjacency filter
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-10: Information Input Validation - Rows with the wrong shape are rejected
//! - CM-8: System Component Inventory - Adjacencies identify neighboring routers

use serde::Serialize;
use std::str::FromStr;

use crate::error::RowError;

/// Columns in one line of `show ip ospf neighbor`.
pub const NEIGHBOR_COLUMN_COUNT: usize = 6;

/// State marker of a fully established, two-way adjacency.
pub const FULL_ADJACENCY_MARKER: &str = "FULL";

/// One adjacency line, e.g.
///
/// ```text
/// 192.168.0.4       1   FULL/DR         00:00:31    10.100.4.4      GigabitEthernet4
/// ```
///
/// `router_id` is by convention the address of the neighbor's primary
/// interface, not of the adjacency itself; `address` is the neighbor's
/// address on the shared segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NeighborRow {
    pub router_id: String,
    /// Not used for discovery.
    pub priority: String,
    pub state: String,
    /// Not used for discovery.
    pub dead_time: String,
    pub address: String,
    pub interface: String,
}

impl NeighborRow {
    /// Tokenizes one line on runs of whitespace.
    pub fn parse(line: &str) -> Result<Self, RowError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [router_id, priority, state, dead_time, address, interface] = tokens.as_slice() else {
            return Err(RowError::ColumnCount {
                expected: NEIGHBOR_COLUMN_COUNT,
                found: tokens.len(),
                line: line.trim().to_string(),
            });
        };

        Ok(Self {
            router_id: router_id.to_string(),
            priority: priority.to_string(),
            state: state.to_string(),
            dead_time: dead_time.to_string(),
            address: address.to_string(),
            interface: interface.to_string(),
        })
    }

    /// Returns true if the adjacency state carries `marker`.
    ///
    /// States have role suffixes (`FULL/DR`, `FULL/BDR`), so this is a
    /// containment test rather than equality.
    #[inline]
    pub fn is_full_adjacency(&self, marker: &str) -> bool {
        self.state.contains(marker)
    }
}

impl FromStr for NeighborRow {
    type Err = RowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NeighborRow::parse(s)
    }
}

/// Lazily parses a neighbor-table block, one item per non-blank line.
pub fn parse_neighbor_rows(block: &str) -> impl Iterator<Item = Result<NeighborRow, RowError>> + '_ {
    block
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(NeighborRow::parse)
}
