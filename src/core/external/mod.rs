//! Seams to everything outside the process: ICMP, DNS, the two port
//! scanners, HTTP and the credential probes.
//!
//! The pipeline only ever talks to the traits below. The concrete adapters
//! shell out to the usual tools (`ping`, `masscan`, `nmap`) or use the async
//! clients from the dependency stack.

pub mod dns;
pub mod http;
pub mod masscan;
pub mod nmap;
pub mod ping;
pub mod probes;

use crate::core::error::{Result, ScanError};
use crate::core::models::{HeaderFields, HostPortInfo, ProbeOutcome, SweepHit};
use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// ICMP reachability check.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn is_alive(&self, target: &str) -> bool;
}

/// A-record lookup. `Ok(None)` means the name has no IPv4 address.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    async fn lookup_ipv4(&self, name: &str) -> Result<Option<Ipv4Addr>>;
}

/// Tier-1 sweep over a host or CIDR block.
#[async_trait]
pub trait SweepScanner: Send + Sync {
    async fn sweep(&self, target: &str) -> Result<Vec<SweepHit>>;
}

/// Tier-2 service identification. Returns one entry per host that answered.
#[async_trait]
pub trait DetailScanner: Send + Sync {
    async fn scan(&self, target: &str, ports: &[u16]) -> Result<Vec<HostPortInfo>>;
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderFields,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// Tries known weak credentials against one service instance.
#[async_trait]
pub trait CredentialProbe: Send + Sync {
    async fn run(&self, ip: &str, port: u16) -> Result<ProbeOutcome>;
}

/// Runs an external tool, collecting its output, and kills it on timeout.
pub async fn run_tool(binary: &str, args: &[String], timeout: Duration) -> Result<Output> {
    debug!(tool = binary, ?args, "Running external tool.");
    let child = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ScanError::external_tool(binary, format!("failed to start: {e}")))?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => Ok(output?),
        Err(_) => Err(ScanError::timeout(timeout)),
    }
}

/// Fails with the tool's stderr when it exited unsuccessfully.
pub(crate) fn ensure_success(tool: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(ScanError::external_tool(tool, format!("Command failed: {}", stderr.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_an_external_tool_error() {
        let err = run_tool("webfind-no-such-binary", &[], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::ExternalTool { .. }));
    }

    #[tokio::test]
    async fn slow_tool_times_out() {
        let err = run_tool("sleep", &["5".to_string()], Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Timeout { .. }));
    }
}
