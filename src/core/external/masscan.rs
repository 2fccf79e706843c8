// src/core/external/masscan.rs

use super::{SweepScanner, ensure_success, run_tool};
use crate::config::MasscanSettings;
use crate::core::error::Result;
use crate::core::models::SweepHit;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Tier-1 sweep backed by `masscan` in list-output mode.
pub struct Masscan {
    settings: MasscanSettings,
}

impl Masscan {
    pub fn new(settings: MasscanSettings) -> Self {
        Self { settings }
    }

    fn build_args(&self, target: &str) -> Vec<String> {
        vec![
            target.to_string(),
            format!("-p{}", self.settings.ports),
            "--rate".to_string(),
            self.settings.rate.to_string(),
            "-oL".to_string(),
            "-".to_string(),
        ]
    }
}

#[async_trait]
impl SweepScanner for Masscan {
    async fn sweep(&self, target: &str) -> Result<Vec<SweepHit>> {
        info!(target, "Starting masscan sweep.");
        let args = self.build_args(target);
        let timeout = Duration::from_secs(self.settings.timeout_secs);
        let output = run_tool(&self.settings.binary, &args, timeout).await?;
        ensure_success("masscan", &output)?;

        let hits = parse_list_output(&String::from_utf8_lossy(&output.stdout));
        info!(target, hosts = hits.len(), "Masscan sweep finished.");
        Ok(hits)
    }
}

/// Parses `-oL` lines (`open tcp <port> <ip> <timestamp>`), grouping ports by
/// host in first-seen order.
fn parse_list_output(text: &str) -> Vec<SweepHit> {
    let mut hits: Vec<SweepHit> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (port, host) = match fields.as_slice() {
            ["open", "tcp", port, host, ..] => match port.parse::<u16>() {
                Ok(p) => (p, *host),
                Err(_) => {
                    debug!(line, "Skipping masscan line with bad port.");
                    continue;
                }
            },
            _ => continue,
        };
        match hits.iter_mut().find(|h| h.host == host) {
            Some(hit) => hit.open_ports.push(port),
            None => hits.push(SweepHit { host: host.to_string(), open_ports: vec![port] }),
        }
    }
    for hit in &mut hits {
        hit.open_ports.sort_unstable();
        hit.open_ports.dedup();
    }
    hits
}
