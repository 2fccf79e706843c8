// src/core/external/probes.rs

use super::{CredentialProbe, ensure_success, run_tool};
use crate::core::error::{Result, ScanError};
use crate::core::models::ProbeOutcome;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

/// Runs an executable probe as `<script> <ip> <port>` and reads a JSON
/// `{"weak": bool, "username": "...", "passwd": "..."}` from its stdout.
pub struct ScriptProbe {
    script: PathBuf,
    timeout: Duration,
}

impl ScriptProbe {
    pub fn new(script: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self { script: script.into(), timeout }
    }
}

#[async_trait]
impl CredentialProbe for ScriptProbe {
    async fn run(&self, ip: &str, port: u16) -> Result<ProbeOutcome> {
        let name = self.script.display().to_string();
        let args = [ip.to_string(), port.to_string()];
        let output = run_tool(&name, &args, self.timeout).await?;
        ensure_success(&name, &output)?;
        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| ScanError::probe(name, "no result object on stdout"))
    }
}

/// The result object is the last stdout line that parses; anything printed
/// before it is progress chatter.
fn parse_probe_output(stdout: &str) -> Option<ProbeOutcome> {
    if let Ok(outcome) = serde_json::from_str(stdout.trim()) {
        return Some(outcome);
    }
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .find_map(|l| serde_json::from_str(l).ok())
}

/// Checks whether a Redis instance accepts commands without authentication.
pub struct RedisProbe {
    timeout: Duration,
}

impl RedisProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn ping(ip: &str, port: u16) -> Result<String> {
        let mut stream = TcpStream::connect((ip, port)).await?;
        stream.write_all(b"PING\r\n").await?;
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).await?;
        Ok(line.trim_end().to_string())
    }
}

#[async_trait]
impl CredentialProbe for RedisProbe {
    async fn run(&self, ip: &str, port: u16) -> Result<ProbeOutcome> {
        let reply = tokio::time::timeout(self.timeout, Self::ping(ip, port))
            .await
            .map_err(|_| ScanError::timeout(self.timeout))??;
        debug!(ip, port, reply = %reply, "Redis replied to PING.");

        if reply.starts_with("+PONG") {
            Ok(ProbeOutcome { weak: true, username: String::new(), passwd: String::new() })
        } else if reply.starts_with('-') {
            // -NOAUTH / -ERR: the server wants credentials.
            Ok(ProbeOutcome::default())
        } else {
            Err(ScanError::probe("redis", format!("unexpected reply {:?}", reply)))
        }
    }
}
