//! Device session abstraction and its default implementations.
//!
//! A session issues the neighbor-table (and interface) queries against one
//! device and returns the raw reply text. The reply envelope is opaque here;
//! [`crate::response`] extracts the text block from it.
//!
//! # Example
//!
//! ```ignore
//! use ospf_linkd::session::{DeviceSession, ShellSession};
//!
//! let session = ShellSession::new(
//!     "ssh admin@192.168.0.1 'show ip ospf neighbor | include Ethernet'",
//!     "ssh admin@192.168.0.1 'show interfaces'",
//! );
//! let reply = session.issue_neighbor_query(&local_device).await?;
//! ```

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use topo_types::DeviceId;

use crate::error::SessionError;

/// CLI command whose output lists OSPF adjacencies.
pub const NEIGHBOR_EXEC_COMMAND: &str = "show ip ospf neighbor | include Ethernet";

/// CLI command whose output lists interface status, MAC, address and bandwidth.
pub const INTERFACE_EXEC_COMMAND: &str =
    "show interfaces | include (line protocol)|(bia)|(Internet address is)|(BW [0-9]+ Kbit/sec)";

/// Transport to a single device.
#[async_trait]
pub trait DeviceSession: Send + Sync {
    /// Issues the neighbor-table query and returns the raw reply.
    async fn issue_neighbor_query(&self, device: &DeviceId) -> Result<String, SessionError>;

    /// Issues the interface query and returns the raw reply.
    async fn issue_interface_query(&self, device: &DeviceId) -> Result<String, SessionError>;
}

/// Builds a NETCONF `<get>` RPC that runs `exec` as an operational CLI
/// command and returns its output as a text block.
fn cli_exec_rpc(exec: &str) -> String {
    let mut rpc = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    // message-id is injected by the transport
    rpc.push_str(r#"<rpc xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">"#);
    rpc.push_str("<get>");
    rpc.push_str("<filter>");
    rpc.push_str("<config-format-text-cmd>");
    rpc.push_str("<text-filter-spec> | include interface </text-filter-spec>");
    rpc.push_str("</config-format-text-cmd>");
    rpc.push_str("<oper-data-format-text-block>");
    rpc.push_str("<exec>");
    rpc.push_str(exec);
    rpc.push_str("</exec>");
    rpc.push_str("</oper-data-format-text-block>");
    rpc.push_str("</filter>");
    rpc.push_str("</get>");
    rpc.push_str("</rpc>");
    rpc
}

/// NETCONF request body for the neighbor-table query.
pub fn neighbor_query_rpc() -> String {
    cli_exec_rpc(NEIGHBOR_EXEC_COMMAND)
}

/// NETCONF request body for the interface query.
pub fn interface_query_rpc() -> String {
    cli_exec_rpc(INTERFACE_EXEC_COMMAND)
}

/// Session that runs local shell commands (e.g. `vtysh`) and returns their
/// stdout.
#[derive(Debug, Clone)]
pub struct ShellSession {
    neighbor_command: String,
    interface_command: String,
}

impl ShellSession {
    pub fn new(neighbor_command: impl Into<String>, interface_command: impl Into<String>) -> Self {
        Self {
            neighbor_command: neighbor_command.into(),
            interface_command: interface_command.into(),
        }
    }

    /// Runs `cmd` through `/bin/sh -c`, failing on spawn error or non-zero exit.
    async fn run(cmd: &str) -> Result<String, SessionError> {
        tracing::debug!(command = %cmd, "Executing session command");

        let output = Command::new("/bin/sh")
            .arg("-c")
            .arg(cmd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SessionError::Exec {
                command: cmd.to_string(),
                source: e,
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if exit_code != 0 {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(
                command = %cmd,
                exit_code = exit_code,
                stderr = %stderr,
                "Session command failed"
            );
            return Err(SessionError::CommandFailed {
                command: cmd.to_string(),
                exit_code,
                output: if stderr.is_empty() { stdout } else { stderr },
            });
        }

        Ok(stdout)
    }
}

#[async_trait]
impl DeviceSession for ShellSession {
    async fn issue_neighbor_query(&self, device: &DeviceId) -> Result<String, SessionError> {
        tracing::trace!(device = %device, "Issuing neighbor query");
        Self::run(&self.neighbor_command).await
    }

    async fn issue_interface_query(&self, device: &DeviceId) -> Result<String, SessionError> {
        tracing::trace!(device = %device, "Issuing interface query");
        Self::run(&self.interface_command).await
    }
}

/// Session that replays canned replies (for testing and offline replay)
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    neighbor_reply: String,
    interface_reply: String,
}

impl StaticSession {
    pub fn new(neighbor_reply: impl Into<String>) -> Self {
        Self {
            neighbor_reply: neighbor_reply.into(),
            interface_reply: String::new(),
        }
    }

    pub fn with_interface_reply(mut self, reply: impl Into<String>) -> Self {
        self.interface_reply = reply.into();
        self
    }
}

#[async_trait]
impl DeviceSession for StaticSession {
    async fn issue_neighbor_query(&self, _device: &DeviceId) -> Result<String, SessionError> {
        Ok(self.neighbor_reply.clone())
    }

    async fn issue_interface_query(&self, _device: &DeviceId) -> Result<String, SessionError> {
        Ok(self.interface_reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> DeviceId {
        "netconf:192.168.0.1:22".parse().unwrap()
    }

    #[test]
    fn test_neighbor_query_rpc() {
        let rpc = neighbor_query_rpc();
        assert!(rpc.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(rpc.contains("<exec>show ip ospf neighbor | include Ethernet</exec>"));
        assert!(rpc.ends_with("</get></rpc>"));
    }

    #[test]
    fn test_interface_query_rpc() {
        let rpc = interface_query_rpc();
        assert!(rpc.contains("(Internet address is)"));
        assert!(rpc.contains("<oper-data-format-text-block>"));
    }

    #[tokio::test]
    async fn test_shell_session_returns_stdout() {
        let session = ShellSession::new("printf '  a b c  \\n'", "echo ifaces");
        let reply = session.issue_neighbor_query(&device()).await.unwrap();
        assert_eq!(reply, "a b c");
        let reply = session.issue_interface_query(&device()).await.unwrap();
        assert_eq!(reply, "ifaces");
    }

    #[tokio::test]
    async fn test_shell_session_failure() {
        let session = ShellSession::new("echo boom >&2; exit 3", "true");
        match session.issue_neighbor_query(&device()).await {
            Err(SessionError::CommandFailed {
                exit_code, output, ..
            }) => {
                assert_eq!(exit_code, 3);
                assert_eq!(output, "boom");
            }
            other => panic!("Expected CommandFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_static_session() {
        let session = StaticSession::new("neighbors").with_interface_reply("interfaces");
        assert_eq!(
            session.issue_neighbor_query(&device()).await.unwrap(),
            "neighbors"
        );
        assert_eq!(
            session.issue_interface_query(&device()).await.unwrap(),
            "interfaces"
        );
    }
}
