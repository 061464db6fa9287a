//! MAC address type with parsing for the formats network CLIs print.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 48-bit Ethernet MAC address.
///
/// # Examples
///
/// ```
/// use topo_types::MacAddress;
///
/// let mac: MacAddress = "2c:c2:60:58:f7:d5".parse().unwrap();
///
/// // Cisco IOS prints MACs as three dotted 16-bit groups
/// let dotted: MacAddress = "2cc2.6058.f7d5".parse().unwrap();
/// assert_eq!(mac, dotted);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// The zero/null MAC address (00:00:00:00:00:00).
    pub const ZERO: MacAddress = MacAddress([0, 0, 0, 0, 0, 0]);

    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Returns true if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == Self::ZERO.0
    }

    /// Parses the `xxxx.xxxx.xxxx` form.
    fn parse_dotted(s: &str) -> Option<Self> {
        let groups: Vec<&str> = s.split('.').collect();
        if groups.len() != 3 || groups.iter().any(|g| g.len() != 4) {
            return None;
        }
        let mut bytes = [0u8; 6];
        for (i, group) in groups.iter().enumerate() {
            let word = u16::from_str_radix(group, 16).ok()?;
            bytes[i * 2..i * 2 + 2].copy_from_slice(&word.to_be_bytes());
        }
        Some(MacAddress(bytes))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('.') {
            return Self::parse_dotted(s)
                .ok_or_else(|| ParseError::InvalidMacAddress(s.to_string()));
        }

        let separator = if s.contains(':') { ':' } else { '-' };

        let parts: Vec<&str> = s.split(separator).collect();
        if parts.len() != 6 {
            return Err(ParseError::InvalidMacAddress(s.to_string()));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| ParseError::InvalidMacAddress(s.to_string()))?;
        }

        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_colon_format() {
        let mac: MacAddress = "00:11:22:33:44:55".parse().unwrap();
        assert_eq!(mac.as_bytes(), &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    }

    #[test]
    fn test_parse_dotted_format() {
        let mac: MacAddress = "2cc2.6058.f7d5".parse().unwrap();
        assert_eq!(mac.as_bytes(), &[0x2c, 0xc2, 0x60, 0x58, 0xf7, 0xd5]);
        assert_eq!(mac.to_string(), "2c:c2:60:58:f7:d5");
    }

    #[test]
    fn test_invalid_format() {
        assert!("invalid".parse::<MacAddress>().is_err());
        assert!("00:11:22:33:44".parse::<MacAddress>().is_err());
        assert!("2cc2.6058".parse::<MacAddress>().is_err());
        assert!("2cc2.6058.f7d".parse::<MacAddress>().is_err());
        assert!("zzzz.6058.f7d5".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_zero() {
        assert!(MacAddress::ZERO.is_zero());
        assert!(!MacAddress::new([0, 0, 0, 0, 0, 1]).is_zero());
    }
}
