//! Network topology primitives for link discovery.
//!
//! This crate provides type-safe representations of the objects a topology
//! model is built from:
//!
//! - [`DeviceId`]: URI-style device identity (`netconf:192.168.0.4:22`)
//! - [`PortNumber`]: Port number on a device, with an `UNRESOLVED` sentinel
//! - [`ConnectPoint`]: A (device, port) endpoint
//! - [`LinkDescription`] / [`LinkSet`]: Discovered edges between endpoints
//! - [`PortDescription`]: Port inventory entry with address annotations
//! - [`MacAddress`] / [`InterfaceAddress`]: Addressing helpers

mod device;
mod ip;
mod link;
mod mac;
mod port;

pub use device::{ConnectPoint, DeviceId};
pub use ip::InterfaceAddress;
pub use link::{Directionality, LinkDescription, LinkSet, LinkSetDiff, LinkType};
pub use mac::MacAddress;
pub use port::{annotation_keys, PortDescription, PortNumber, PortType};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid interface address format: {0}")]
    InvalidInterfaceAddress(String),

    #[error("invalid device id: {0}")]
    InvalidDeviceId(String),

    #[error("invalid port number: {0}")]
    InvalidPortNumber(String),
}
