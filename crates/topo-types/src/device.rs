//! Device identity and connect point types.

use crate::{ParseError, PortNumber};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// URI-style identity of a device known to the control platform.
///
/// The identity is `scheme:scheme-specific-part`; devices onboarded over a
/// transport use `scheme:host:port` (for example `netconf:192.168.0.4:22`).
///
/// # Examples
///
/// ```
/// use topo_types::DeviceId;
///
/// let id: DeviceId = "netconf:192.168.0.4:22".parse().unwrap();
/// assert_eq!(id.scheme(), "netconf");
///
/// let v6 = DeviceId::from_transport("netconf", &"2001:db8::1".parse().unwrap(), 830);
/// assert_eq!(v6.as_str(), "netconf:[2001:db8::1]:830");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a device id from a full URI string.
    ///
    /// The scheme must satisfy [`DeviceId::is_valid_scheme`]; the remainder
    /// must be non-empty.
    pub fn new(uri: impl Into<String>) -> Result<Self, ParseError> {
        let uri = uri.into();
        let Some((scheme, rest)) = uri.split_once(':') else {
            return Err(ParseError::InvalidDeviceId(uri));
        };
        if !Self::is_valid_scheme(scheme) || rest.is_empty() {
            return Err(ParseError::InvalidDeviceId(uri));
        }
        Ok(DeviceId(uri))
    }

    /// Returns true if `scheme` is non-empty, starts with a letter and
    /// contains only letters, digits, `+`, `-` or `.`.
    pub fn is_valid_scheme(scheme: &str) -> bool {
        scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    }

    /// Builds the identity a device gets when onboarded at `host:port`.
    ///
    /// `scheme` is not checked here; callers validate it up front with
    /// [`DeviceId::is_valid_scheme`].
    pub fn from_transport(scheme: &str, host: &IpAddr, port: u16) -> Self {
        match host {
            IpAddr::V4(v4) => DeviceId(format!("{}:{}:{}", scheme, v4, port)),
            IpAddr::V6(v6) => DeviceId(format!("{}:[{}]:{}", scheme, v6, port)),
        }
    }

    /// Returns the URI scheme (e.g. `netconf`).
    pub fn scheme(&self) -> &str {
        self.0.split_once(':').map(|(s, _)| s).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceId::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        DeviceId::new(s)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

/// A (device, port) endpoint of a link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectPoint {
    pub device: DeviceId,
    pub port: PortNumber,
}

impl ConnectPoint {
    pub fn new(device: DeviceId, port: PortNumber) -> Self {
        Self { device, port }
    }
}

impl fmt::Display for ConnectPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device, self.port)
    }
}
