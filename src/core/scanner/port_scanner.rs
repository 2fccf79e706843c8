// src/core/scanner/port_scanner.rs

use crate::core::error::{Result, ScanError};
use crate::core::external::{DetailScanner, SweepScanner};
use crate::core::models::HostPortInfo;
use std::sync::Arc;
use tracing::{debug, info};

/// How far a port scan reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Scan the host's whole /24 instead of the host alone.
    pub whole_subnet: bool,
    /// Sweep every port first, then identify services on what is open.
    pub all_ports: bool,
}

/// The `<network>/24` block containing `host`.
pub fn subnet_of(host: &str) -> Option<String> {
    let octets: Vec<u8> = host.split('.').map(|o| o.parse::<u8>().ok()).collect::<Option<_>>()?;
    match octets.as_slice() {
        [a, b, c, _] => Some(format!("{a}.{b}.{c}.0/24")),
        _ => None,
    }
}

/// Sequences the sweep and detail scanners for one resolved host.
pub struct PortScanOrchestrator {
    sweep: Arc<dyn SweepScanner>,
    detail: Arc<dyn DetailScanner>,
    common_ports: Vec<u16>,
}

impl PortScanOrchestrator {
    pub fn new(sweep: Arc<dyn SweepScanner>, detail: Arc<dyn DetailScanner>, common_ports: Vec<u16>) -> Self {
        Self { sweep, detail, common_ports }
    }

    /// Scans `host`, or its whole /24, and returns the port/service list for
    /// `domain`.
    ///
    /// With `all_ports` the sweep scanner finds open ports first and each hit
    /// gets its own detail scan; otherwise one detail scan covers the common
    /// ports. Scanner failures propagate to the caller.
    ///
    /// # Arguments
    /// * `domain` - The target as given by the user, used for logging.
    /// * `host` - The resolved IPv4 address of `domain`.
    /// * `options` - Subnet and all-ports switches for this run.
    ///
    /// # Returns
    /// One `HostPortInfo` per scanned host. A single-host scan always yields
    /// exactly one entry, empty when nothing answered.
    pub async fn scan(&self, domain: &str, host: &str, options: ScanOptions) -> Result<Vec<HostPortInfo>> {
        let target = if options.whole_subnet {
            let block = subnet_of(host)
                .ok_or_else(|| ScanError::parse(format!("'{}' is not an IPv4 address", host)))?;
            info!(domain, target = %block, "Scanning the whole /24.");
            block
        } else {
            host.to_string()
        };

        let results = if options.all_ports {
            self.sweep_then_detail(&target).await?
        } else {
            self.detail_common_ports(&target, host, options.whole_subnet).await?
        };
        info!(domain, hosts = results.len(), "Port scan finished.");
        Ok(results)
    }

    async fn sweep_then_detail(&self, target: &str) -> Result<Vec<HostPortInfo>> {
        let hits = self.sweep.sweep(target).await?;
        debug!(target, hosts = hits.len(), "Sweep found live hosts.");

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let found = self.detail.scan(&hit.host, &hit.open_ports).await?;
            results.push(pick_host(found, &hit.host));
        }
        Ok(results)
    }

    async fn detail_common_ports(&self, target: &str, host: &str, whole_subnet: bool) -> Result<Vec<HostPortInfo>> {
        let found = self.detail.scan(target, &self.common_ports).await?;
        if whole_subnet {
            // One entry per answering host keeps every `ip` a plain address.
            Ok(found)
        } else {
            Ok(vec![pick_host(found, host)])
        }
    }
}

/// The entry for `host` from a single-host detail scan, or an empty one.
fn pick_host(mut found: Vec<HostPortInfo>, host: &str) -> HostPortInfo {
    match found.iter().position(|h| h.ip == host) {
        Some(i) => found.swap_remove(i),
        None if !found.is_empty() => found.swap_remove(0),
        None => HostPortInfo::empty(host),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{PortServiceRecord, SweepHit};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubSweep {
        targets: Mutex<Vec<String>>,
        hits: Vec<SweepHit>,
    }

    #[async_trait]
    impl SweepScanner for StubSweep {
        async fn sweep(&self, target: &str) -> Result<Vec<SweepHit>> {
            self.targets.lock().unwrap().push(target.to_string());
            Ok(self.hits.clone())
        }
    }

    /// Reports every requested port as `http` on the requested target.
    #[derive(Default)]
    struct StubDetail {
        calls: Mutex<Vec<(String, Vec<u16>)>>,
        fail: bool,
    }

    #[async_trait]
    impl DetailScanner for StubDetail {
        async fn scan(&self, target: &str, ports: &[u16]) -> Result<Vec<HostPortInfo>> {
            self.calls.lock().unwrap().push((target.to_string(), ports.to_vec()));
            if self.fail {
                return Err(ScanError::external_tool("nmap", "exit 1"));
            }
            let port_info = ports
                .iter()
                .map(|&port| PortServiceRecord { port, service: "http".into(), name: String::new() })
                .collect();
            Ok(vec![HostPortInfo { ip: target.to_string(), port_info }])
        }
    }

    fn orchestrator(sweep: Arc<StubSweep>, detail: Arc<StubDetail>) -> PortScanOrchestrator {
        PortScanOrchestrator::new(sweep, detail, vec![22, 80, 443])
    }

    #[test]
    fn subnet_uses_network_address() {
        assert_eq!(subnet_of("93.184.216.34").as_deref(), Some("93.184.216.0/24"));
        assert_eq!(subnet_of("010.0.0.7").as_deref(), Some("10.0.0.0/24"));
        assert!(subnet_of("example.com").is_none());
        assert!(subnet_of("1.2.3").is_none());
    }

    #[tokio::test]
    async fn common_ports_mode_runs_one_detail_scan() {
        let sweep = Arc::new(StubSweep::default());
        let detail = Arc::new(StubDetail::default());
        let result = orchestrator(sweep.clone(), detail.clone())
            .scan("example.com", "93.184.216.34", ScanOptions::default())
            .await
            .unwrap();

        assert!(sweep.targets.lock().unwrap().is_empty());
        let calls = detail.calls.lock().unwrap();
        assert_eq!(*calls, vec![("93.184.216.34".to_string(), vec![22, 80, 443])]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].ip, "93.184.216.34");
        assert_eq!(result[0].port_info.len(), 3);
    }

    #[tokio::test]
    async fn subnet_sweep_details_every_hit() {
        let sweep = Arc::new(StubSweep {
            hits: vec![
                SweepHit { host: "10.0.0.3".into(), open_ports: vec![22] },
                SweepHit { host: "10.0.0.9".into(), open_ports: vec![80, 6379] },
            ],
            ..Default::default()
        });
        let detail = Arc::new(StubDetail::default());
        let options = ScanOptions { whole_subnet: true, all_ports: true };
        let result = orchestrator(sweep.clone(), detail.clone())
            .scan("lan.example", "10.0.0.5", options)
            .await
            .unwrap();

        assert_eq!(*sweep.targets.lock().unwrap(), ["10.0.0.0/24"]);
        let calls = detail.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![("10.0.0.3".to_string(), vec![22]), ("10.0.0.9".to_string(), vec![80, 6379])]
        );
        let ips: Vec<_> = result.iter().map(|h| h.ip.as_str()).collect();
        assert_eq!(ips, ["10.0.0.3", "10.0.0.9"]);
    }

    #[tokio::test]
    async fn single_host_sweep_targets_the_address() {
        let sweep = Arc::new(StubSweep {
            hits: vec![SweepHit { host: "93.184.216.34".into(), open_ports: vec![443, 8443] }],
            ..Default::default()
        });
        let detail = Arc::new(StubDetail::default());
        let options = ScanOptions { whole_subnet: false, all_ports: true };
        let result = orchestrator(sweep.clone(), detail.clone())
            .scan("example.com", "93.184.216.34", options)
            .await
            .unwrap();

        assert_eq!(*sweep.targets.lock().unwrap(), ["93.184.216.34"]);
        assert_eq!(*detail.calls.lock().unwrap(), vec![("93.184.216.34".to_string(), vec![443, 8443])]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].ip, "93.184.216.34");
    }

    #[tokio::test]
    async fn subnet_without_sweep_scans_block_with_common_ports() {
        let sweep = Arc::new(StubSweep::default());
        let detail = Arc::new(StubDetail::default());
        let options = ScanOptions { whole_subnet: true, all_ports: false };
        orchestrator(sweep.clone(), detail.clone())
            .scan("lan.example", "10.0.0.5", options)
            .await
            .unwrap();

        assert!(sweep.targets.lock().unwrap().is_empty());
        assert_eq!(detail.calls.lock().unwrap()[0].0, "10.0.0.0/24");
    }

    #[tokio::test]
    async fn empty_detail_result_still_yields_host_entry() {
        struct Silent;
        #[async_trait]
        impl DetailScanner for Silent {
            async fn scan(&self, _target: &str, _ports: &[u16]) -> Result<Vec<HostPortInfo>> {
                Ok(Vec::new())
            }
        }
        let orchestrator = PortScanOrchestrator::new(Arc::new(StubSweep::default()), Arc::new(Silent), vec![80]);
        let result = orchestrator.scan("quiet.example", "10.9.9.9", ScanOptions::default()).await.unwrap();
        assert_eq!(result, vec![HostPortInfo::empty("10.9.9.9")]);
    }

    #[tokio::test]
    async fn scanner_failure_propagates() {
        let detail = Arc::new(StubDetail { fail: true, ..Default::default() });
        let result = orchestrator(Arc::new(StubSweep::default()), detail)
            .scan("example.com", "93.184.216.34", ScanOptions::default())
            .await;
        assert!(result.is_err());
    }
}
