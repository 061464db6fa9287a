//! Error types for ospf-linkd
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-11: Error Handling - Structured error types with contextual information
//! - SI-10: Information Input Validation - Row-level errors never abort a poll

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that abort a whole poll or a configuration load.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The device session could not produce a reply
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// The reply envelope had no usable response section
    #[error("Response error: {0}")]
    Response(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The poll did not finish within its deadline
    #[error("Poll timed out after {0:?}")]
    Timeout(Duration),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for ospf-linkd operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Failures of the transport that talks to the device.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Failed to spawn the query command.
    #[error("Failed to execute session command '{command}': {source}")]
    Exec {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The query command returned non-zero exit code.
    #[error("Session command failed: '{command}' (exit code {exit_code}): {output}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },
}

/// Reasons a single neighbor-table row is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// Line did not tokenize into the fixed column count.
    #[error("expected {expected} columns, found {found}: '{line}'")]
    ColumnCount {
        expected: usize,
        found: usize,
        line: String,
    },

    /// Local interface name has no parsable port suffix.
    #[error("cannot derive local port from interface '{interface}' (prefix '{prefix}')")]
    LocalPort { interface: String, prefix: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DiscoveryError::Response("no <response> element".to_string());
        assert_eq!(err.to_string(), "Response error: no <response> element");
    }

    #[test]
    fn test_session_error_wraps() {
        let err: DiscoveryError = SessionError::CommandFailed {
            command: "vtysh -c 'show ip ospf neighbor'".to_string(),
            exit_code: 1,
            output: "% OSPF not enabled".to_string(),
        }
        .into();
        assert!(err.to_string().starts_with("Session error: "));
        assert!(err.to_string().contains("exit code 1"));
    }

    #[test]
    fn test_row_error_display() {
        let err = RowError::ColumnCount {
            expected: 6,
            found: 5,
            line: "192.168.0.4 1 FULL/DR 00:00:31 10.100.4.4".to_string(),
        };
        assert!(err.to_string().starts_with("expected 6 columns, found 5"));

        let err = RowError::LocalPort {
            interface: "Loopback0".to_string(),
            prefix: "GigabitEthernet".to_string(),
        };
        assert!(err.to_string().contains("Loopback0"));
    }

    #[test]
    fn test_timeout_display() {
        let err = DiscoveryError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Poll timed out after 30s");
    }
}
