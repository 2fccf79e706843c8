// src/core/scanner/mod.rs

// Declares the per-stage scanners and the coordinator that runs them.
pub mod fingerprint_scanner;
pub mod port_scanner;
pub mod target_resolver;
pub mod weak_scanner;
pub mod web_prober;

use crate::config::{FingerprintEntry, Settings};
use crate::core::external::{DetailScanner, DnsLookup, HttpFetcher, LivenessProbe, SweepScanner};
use crate::core::models::{DomainPortResult, ScanReport, WeakCredentialFinding, WebInfo};
use crate::core::report;
use self::fingerprint_scanner::classify;
use self::port_scanner::{PortScanOrchestrator, ScanOptions};
use self::target_resolver::TargetResolver;
use self::weak_scanner::WeakScanner;
use self::web_prober::WebProber;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Everything the pipeline needs from the outside world.
#[derive(Clone)]
pub struct Collaborators {
    pub liveness: Arc<dyn LivenessProbe>,
    pub dns: Arc<dyn DnsLookup>,
    pub sweep: Arc<dyn SweepScanner>,
    pub detail: Arc<dyn DetailScanner>,
    pub http: Arc<dyn HttpFetcher>,
}

/// What one target contributed to the report.
#[derive(Debug, Default)]
struct TargetOutcome {
    webinfo: Option<WebInfo>,
    ports: DomainPortResult,
    findings: Vec<WeakCredentialFinding>,
}

/// Runs every target through liveness, port scan, credential scan and web
/// probe, one bounded worker per target.
pub struct Pipeline {
    resolver: TargetResolver,
    ports: PortScanOrchestrator,
    web: WebProber,
    weak: Option<WeakScanner>,
    fingerprints: Vec<FingerprintEntry>,
    options: ScanOptions,
    workers: usize,
    target_timeout: Duration,
}

impl Pipeline {
    /// `weak: None` skips the credential scan entirely.
    pub fn new(collaborators: Collaborators, settings: &Settings, options: ScanOptions, weak: Option<WeakScanner>) -> Self {
        Self {
            resolver: TargetResolver::new(collaborators.liveness, collaborators.dns),
            ports: PortScanOrchestrator::new(collaborators.sweep, collaborators.detail, settings.common_ports.clone()),
            web: WebProber::new(collaborators.http),
            weak,
            fingerprints: settings.fingerprints.clone(),
            options,
            workers: settings.worker_count(),
            target_timeout: settings.domain_timeout(),
        }
    }

    /// Scans all targets and assembles the report.
    ///
    /// Targets run concurrently, at most `workers` at a time, each bounded by
    /// the per-target timeout. A target that failed or timed out simply
    /// contributes nothing.
    ///
    /// # Arguments
    /// * `targets` - Domains or IPv4 addresses, in the order they were given.
    ///
    /// # Returns
    /// A `ScanReport` whose web infos follow the input order, whose port map
    /// is keyed by target, and whose credential findings hold each
    /// `(ip, port, service)` at most once.
    pub async fn run(self: Arc<Self>, targets: Vec<String>) -> ScanReport {
        info!(targets = targets.len(), workers = self.workers, "Starting scan.");
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for (index, target) in targets.into_iter().enumerate() {
            let pipeline = Arc::clone(&self);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = pipeline.run_bounded(&target).await;
                (index, target, outcome)
            });
        }

        let mut finished = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(done) => finished.push(done),
                Err(e) => error!(error = %e, "Target task panicked."),
            }
        }
        finished.sort_by_key(|(index, _, _)| *index);

        let mut webinfo = Vec::new();
        let mut ip_port_info = BTreeMap::new();
        let mut findings = Vec::new();
        for (_, target, outcome) in finished {
            let Some(outcome) = outcome else { continue };
            webinfo.extend(outcome.webinfo);
            ip_port_info.extend(outcome.ports);
            findings.extend(outcome.findings);
        }

        info!(
            web = webinfo.len(),
            domains = ip_port_info.len(),
            weak = findings.len(),
            "Scan finished."
        );
        report::aggregate(webinfo, ip_port_info, findings)
    }

    /// `None` when the target ran out of time; partial results are dropped.
    async fn run_bounded(&self, target: &str) -> Option<TargetOutcome> {
        match tokio::time::timeout(self.target_timeout, self.run_target(target)).await {
            Ok(outcome) => Some(outcome),
            Err(_) => {
                warn!(target, budget_secs = self.target_timeout.as_secs(), "Target timed out, discarding its results.");
                None
            }
        }
    }

    async fn run_target(&self, target: &str) -> TargetOutcome {
        info!(target, "Target started.");
        if !self.resolver.is_alive(target).await {
            warn!(target, "Not alive, skipping.");
            return TargetOutcome::default();
        }

        let (webinfo, (ports, findings)) = tokio::join!(self.web_chain(target), self.port_chain(target));
        TargetOutcome { webinfo, ports, findings }
    }

    async fn web_chain(&self, target: &str) -> Option<WebInfo> {
        let webinfo = self.web.probe(target).await?;
        Some(classify(webinfo, &self.fingerprints))
    }

    /// The target's entry in the port map, plus the credential findings on it.
    async fn port_chain(&self, target: &str) -> (DomainPortResult, Vec<WeakCredentialFinding>) {
        let Some(host) = self.resolver.resolve_address(target).await else {
            warn!(target, "Cannot resolve, skipping port scan.");
            return (DomainPortResult::new(), Vec::new());
        };

        let hosts = match self.ports.scan(target, &host, self.options).await {
            Ok(hosts) => hosts,
            Err(e) => {
                error!(target, host = %host, error = %e, "Port scan failed.");
                return (DomainPortResult::new(), Vec::new());
            }
        };

        let ports = DomainPortResult::from([(target.to_string(), hosts)]);
        let findings = match &self.weak {
            Some(weak) => weak.scan(&ports).await,
            None => Vec::new(),
        };
        (ports, findings)
    }
}
