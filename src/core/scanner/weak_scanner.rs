// src/core/scanner/weak_scanner.rs

use crate::config::ProbeSettings;
use crate::core::error::{Result, ScanError};
use crate::core::external::CredentialProbe;
use crate::core::external::probes::{RedisProbe, ScriptProbe};
use crate::core::models::{DomainPortResult, HostPortInfo, WeakCredentialFinding};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{debug, error, info, warn};

/// Services that have a credential probe. Anything else is never probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum WeakService {
    Mysql,
    Ssh,
    Ftp,
    Redis,
}

impl WeakService {
    /// Registry key of the probe handling this service, e.g. `mysql_weak`.
    pub fn probe_id(self) -> String {
        format!("{self}_weak")
    }
}

/// Probe implementations keyed by probe id.
#[derive(Default, Clone)]
pub struct ProbeRegistry {
    probes: HashMap<String, Arc<dyn CredentialProbe>>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Native Redis check plus script probes for the remaining services.
    pub fn with_defaults(settings: &ProbeSettings) -> Self {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let mut registry = Self::new();
        for service in WeakService::iter() {
            let id = service.probe_id();
            let probe: Arc<dyn CredentialProbe> = match service {
                WeakService::Redis => Arc::new(RedisProbe::new(timeout)),
                _ => Arc::new(ScriptProbe::new(settings.script_dir.join(&id), timeout)),
            };
            registry.register(id, probe);
        }
        registry
    }

    pub fn register(&mut self, id: impl Into<String>, probe: Arc<dyn CredentialProbe>) {
        self.probes.insert(id.into(), probe);
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn CredentialProbe>> {
        self.probes
            .get(id)
            .cloned()
            .ok_or_else(|| ScanError::ProbeNotRegistered(id.to_string()))
    }
}

/// Dispatches discovered services to their credential probes.
///
/// One scanner serves a whole run: every `(ip, port, service)` triple is
/// probed at most once, however many targets lead to it.
pub struct WeakScanner {
    registry: ProbeRegistry,
    claimed: Mutex<HashSet<(String, u16, WeakService)>>,
}

impl WeakScanner {
    /// Fails if any supported service lacks a registered probe.
    pub fn new(registry: ProbeRegistry) -> Result<Self> {
        for service in WeakService::iter() {
            registry.get(&service.probe_id())?;
        }
        Ok(Self { registry, claimed: Mutex::new(HashSet::new()) })
    }

    /// Runs the probes for every supported service across all domains.
    pub async fn scan(&self, ports: &DomainPortResult) -> Vec<WeakCredentialFinding> {
        let mut findings = Vec::new();
        for hosts in ports.values() {
            findings.extend(self.scan_hosts(hosts).await);
        }
        findings
    }

    async fn scan_hosts(&self, hosts: &[HostPortInfo]) -> Vec<WeakCredentialFinding> {
        let mut findings = Vec::new();
        for host in hosts {
            for record in &host.port_info {
                let Ok(service) = WeakService::from_str(&record.service) else {
                    continue;
                };
                if !self.claim(&host.ip, record.port, service) {
                    debug!(ip = %host.ip, port = record.port, service = %service, "Already probed in this run.");
                    continue;
                }
                if let Some(finding) = self.probe(&host.ip, record.port, service).await {
                    findings.push(finding);
                }
            }
        }
        findings
    }

    /// `false` when the triple was already handed to a probe.
    fn claim(&self, ip: &str, port: u16, service: WeakService) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((ip.to_string(), port, service))
    }

    async fn probe(&self, ip: &str, port: u16, service: WeakService) -> Option<WeakCredentialFinding> {
        let probe_id = service.probe_id();
        info!(ip, port, probe = %probe_id, "Running credential probe.");
        let probe = match self.registry.get(&probe_id) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "Credential probe lookup failed.");
                return None;
            }
        };
        match probe.run(ip, port).await {
            Ok(outcome) if outcome.weak => {
                warn!(ip, port, service = %service, username = %outcome.username, "Weak credentials found.");
                Some(WeakCredentialFinding {
                    ip: ip.to_string(),
                    port,
                    service: service.to_string(),
                    username: outcome.username,
                    password: outcome.passwd,
                })
            }
            Ok(_) => None,
            Err(e) => {
                error!(ip, port, probe = %probe_id, error = %e, "Credential probe failed.");
                None
            }
        }
    }
}
