// src/core/report.rs

use crate::core::error::Result;
use crate::core::models::{DomainPortResult, ScanReport, WeakCredentialFinding, WebInfo};
use chrono::Local;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::{Path, PathBuf};
use tracing::info;

/// Combines the per-target results into the run's single report.
pub fn aggregate(
    webinfo: Vec<WebInfo>,
    ip_port_info: DomainPortResult,
    weak_password: Vec<WeakCredentialFinding>,
) -> ScanReport {
    ScanReport { webinfo, ip_port_info, weak_password }
}

/// The requested domain, or a `YYYYMMDDHHMMSS` timestamp for list runs.
pub fn report_label(domain: Option<&str>) -> String {
    match domain {
        Some(d) => d.to_string(),
        None => Local::now().format("%Y%m%d%H%M%S").to_string(),
    }
}

/// Path a report with `label` is written to under `output_dir`.
pub fn report_path(output_dir: &Path, label: &str) -> PathBuf {
    output_dir.join(label).join(format!("{label}.json"))
}

/// Writes `report` as three-space indented JSON, creating the label's
/// directory when needed and replacing any existing file.
///
/// # Arguments
/// * `report` - The aggregated run result.
/// * `output_dir` - Root directory for all reports.
/// * `label` - The domain, or the run timestamp for list runs.
///
/// # Returns
/// The path written, `<output_dir>/<label>/<label>.json`.
pub fn persist(report: &ScanReport, output_dir: &Path, label: &str) -> Result<PathBuf> {
    let path = report_path(output_dir, label);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, to_pretty_json(report)?)?;
    info!(label, path = %path.display(), "Report saved.");
    Ok(path)
}

/// Three-space indented JSON. Non-ASCII text is written as-is.
fn to_pretty_json(report: &ScanReport) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"   "));
    report.serialize(&mut serializer)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{HeaderFields, HostPortInfo, PortServiceRecord};
    use regex::Regex;

    fn sample_report() -> ScanReport {
        let web = WebInfo {
            domain: "例子.example".into(),
            url: "http://例子.example".into(),
            title: "首页".into(),
            status_code: 200,
            server: Some("nginx".into()),
            language: None,
            framework: "PHP".into(),
            headers: vec![("Server", "nginx"), ("Set-Cookie", "PHPSESSID=1")].into_iter().collect::<HeaderFields>(),
            body: "<title>首页</title>".into(),
        };
        let ports = DomainPortResult::from([(
            "例子.example".to_string(),
            vec![HostPortInfo {
                ip: "10.0.0.5".into(),
                port_info: vec![PortServiceRecord { port: 6379, service: "redis".into(), name: "Redis key-value store".into() }],
            }],
        )]);
        let finding = WeakCredentialFinding {
            ip: "10.0.0.5".into(),
            port: 6379,
            service: "redis".into(),
            username: String::new(),
            password: String::new(),
        };
        aggregate(vec![web], ports, vec![finding])
    }

    #[test]
    fn timestamp_label_when_no_domain() {
        let label = report_label(None);
        assert!(Regex::new(r"^\d{14}$").unwrap().is_match(&label), "{label}");
        assert_eq!(report_label(Some("example.com")), "example.com");
    }

    #[test]
    fn persisted_report_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        let path = persist(&report, dir.path(), "example.com").unwrap();

        assert_eq!(path, dir.path().join("example.com").join("example.com.json"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("首页"), "non-ASCII must not be escaped");
        assert!(text.contains("\n   \"webinfo\""), "three-space indent expected");

        let back: ScanReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn timestamped_report_lands_in_its_own_directory() {
        let dir = tempfile::tempdir().unwrap();
        let label = report_label(None);
        let path = persist(&ScanReport::default(), dir.path(), &label).unwrap();

        let pattern = Regex::new(r"/(\d{14})/(\d{14})\.json$").unwrap();
        let caps = pattern.captures(path.to_str().unwrap()).unwrap();
        assert_eq!(&caps[1], &caps[2]);

        let back: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, serde_json::json!({ "webinfo": "", "ip_port_info": "" }));
    }

    #[test]
    fn persist_overwrites_existing_report() {
        let dir = tempfile::tempdir().unwrap();
        persist(&sample_report(), dir.path(), "example.com").unwrap();
        let path = persist(&ScanReport::default(), dir.path(), "example.com").unwrap();

        let back: ScanReport = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, ScanReport::default());
    }
}
