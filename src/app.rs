// src/app.rs

use crate::config::Settings;
use crate::core::error::Result;
use crate::core::external::dns::HickoryDns;
use crate::core::external::http::ReqwestFetcher;
use crate::core::external::masscan::Masscan;
use crate::core::external::nmap::Nmap;
use crate::core::external::ping::PingProbe;
use crate::core::models::ScanReport;
use crate::core::report;
use crate::core::scanner::port_scanner::ScanOptions;
use crate::core::scanner::target_resolver::resolve_targets;
use crate::core::scanner::weak_scanner::{ProbeRegistry, WeakScanner};
use crate::core::scanner::{Collaborators, Pipeline};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Web and service reconnaissance for a domain or a list of domains.
#[derive(Parser, Debug)]
#[command(name = "webfind-rs", version, about)]
#[command(group(ArgGroup::new("input").required(true).multiple(true).args(["domain", "file"])))]
pub struct Cli {
    /// Target domain or IPv4 address.
    #[arg(short, long)]
    pub domain: Option<String>,

    /// File with one target per line (first column is used).
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Scan the target's whole /24.
    #[arg(short = 'c', long)]
    pub net_c: bool,

    /// Sweep all ports before identifying services.
    #[arg(short, long)]
    pub all_ports: bool,

    /// Skip the weak credential scan.
    #[arg(long)]
    pub no_weak: bool,

    /// Number of targets scanned concurrently.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Directory the report is written under.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase console log detail (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions { whole_subnet: self.net_c, all_ports: self.all_ports }
    }

    /// Loads the config file, then applies command-line overrides.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(output) = &self.output {
            settings.output_dir = output.clone();
        }
        Ok(settings)
    }
}

/// One complete run: build the collaborators, scan, persist.
pub struct App {
    cli: Cli,
    settings: Settings,
}

impl App {
    pub fn new(cli: Cli, settings: Settings) -> Self {
        Self { cli, settings }
    }

    /// Production adapters for every external collaborator.
    fn collaborators(&self) -> Result<Collaborators> {
        Ok(Collaborators {
            liveness: Arc::new(PingProbe::new(self.settings.ping_timeout())),
            dns: Arc::new(HickoryDns::new()),
            sweep: Arc::new(Masscan::new(self.settings.masscan.clone())),
            detail: Arc::new(Nmap::new(self.settings.nmap.clone())),
            http: Arc::new(ReqwestFetcher::new(self.settings.http_timeout())?),
        })
    }

    fn weak_scanner(&self) -> Result<Option<WeakScanner>> {
        if self.cli.no_weak {
            return Ok(None);
        }
        let registry = ProbeRegistry::with_defaults(&self.settings.probes);
        WeakScanner::new(registry).map(Some)
    }

    /// Runs the scan and returns the path of the written report, or `None`
    /// when there was nothing to scan.
    pub async fn run(self) -> Result<Option<PathBuf>> {
        let targets = resolve_targets(self.cli.domain.as_deref(), self.cli.file.as_deref());
        if targets.is_empty() {
            warn!("No targets to scan.");
            return Ok(None);
        }

        let pipeline = Pipeline::new(
            self.collaborators()?,
            &self.settings,
            self.cli.scan_options(),
            self.weak_scanner()?,
        );
        let report = Arc::new(pipeline).run(targets).await;
        self.save(&report).map(Some)
    }

    fn save(&self, report: &ScanReport) -> Result<PathBuf> {
        let label = report::report_label(self.cli.domain.as_deref());
        let path = report::persist(report, &self.settings.output_dir, &label)?;
        info!(path = %path.display(), "Results written.");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn requires_domain_or_file() {
        assert!(Cli::try_parse_from(["webfind-rs"]).is_err());
        assert!(Cli::try_parse_from(["webfind-rs", "-d", "example.com"]).is_ok());
        assert!(Cli::try_parse_from(["webfind-rs", "-f", "domains.txt"]).is_ok());
    }

    #[test]
    fn flags_map_to_scan_options() {
        let cli = Cli::try_parse_from(["webfind-rs", "-d", "example.com", "-c", "-a"]).unwrap();
        assert_eq!(cli.scan_options(), ScanOptions { whole_subnet: true, all_ports: true });

        let cli = Cli::try_parse_from(["webfind-rs", "-d", "example.com"]).unwrap();
        assert_eq!(cli.scan_options(), ScanOptions::default());
    }

    #[test]
    fn command_line_overrides_settings() {
        let cli = Cli::try_parse_from(["webfind-rs", "-d", "example.com", "-w", "3", "-o", "/tmp/reports"]).unwrap();
        let settings = cli.settings().unwrap();
        assert_eq!(settings.workers, 3);
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/reports"));
    }

    #[tokio::test]
    async fn missing_list_file_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from(["webfind-rs", "-f", "/no/such/list.txt", "--no-weak"]).unwrap();
        let settings = Settings { output_dir: dir.path().to_path_buf(), ..Settings::default() };
        assert!(App::new(cli, settings).run().await.unwrap().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
