// src/core/external/ping.rs

use super::LivenessProbe;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Liveness via the system `ping`: one echo request, fixed deadline.
pub struct PingProbe {
    binary: String,
    deadline: Duration,
}

impl PingProbe {
    pub fn new(deadline: Duration) -> Self {
        Self { binary: "ping".to_string(), deadline }
    }

    fn args(&self, target: &str) -> Vec<String> {
        let secs = self.deadline.as_secs().max(1);
        vec![
            "-c".to_string(),
            "1".to_string(),
            "-w".to_string(),
            secs.to_string(),
            target.to_string(),
        ]
    }
}

#[async_trait]
impl LivenessProbe for PingProbe {
    async fn is_alive(&self, target: &str) -> bool {
        let child = Command::new(&self.binary)
            .args(self.args(target))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();
        let mut child = match child {
            Ok(c) => c,
            Err(e) => {
                warn!(target, error = %e, "Could not start ping.");
                return false;
            }
        };

        // ping's own deadline should fire first; this only guards a hung process.
        let guard = self.deadline + Duration::from_secs(2);
        match tokio::time::timeout(guard, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(target, code = ?status.code(), "Ping finished.");
                status.success()
            }
            Ok(Err(e)) => {
                warn!(target, error = %e, "Ping failed.");
                false
            }
            Err(_) => {
                warn!(target, "Ping did not return in time.");
                false
            }
        }
    }
}
