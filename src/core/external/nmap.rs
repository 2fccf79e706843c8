// src/core/external/nmap.rs

use super::{DetailScanner, ensure_success, run_tool};
use crate::config::NmapSettings;
use crate::core::error::{Result, ScanError};
use crate::core::models::{HostPortInfo, PortServiceRecord};
use async_trait::async_trait;
use roxmltree::{Document, Node};
use std::time::Duration;
use tracing::{debug, info};

/// Tier-2 service identification via `nmap -sV` with XML output.
pub struct Nmap {
    settings: NmapSettings,
}

impl Nmap {
    pub fn new(settings: NmapSettings) -> Self {
        Self { settings }
    }

    fn build_args(&self, target: &str, ports: &[u16]) -> Result<Vec<String>> {
        if ports.is_empty() {
            return Err(ScanError::parse("Port list cannot be empty"));
        }
        let port_list = ports.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(",");
        Ok(vec![
            "-sV".to_string(),
            "-Pn".to_string(),
            "--open".to_string(),
            "-p".to_string(),
            port_list,
            "-oX".to_string(),
            "-".to_string(),
            target.to_string(),
        ])
    }
}

#[async_trait]
impl DetailScanner for Nmap {
    async fn scan(&self, target: &str, ports: &[u16]) -> Result<Vec<HostPortInfo>> {
        info!(target, ports = ports.len(), "Starting nmap service scan.");
        let args = self.build_args(target, ports)?;
        let timeout = Duration::from_secs(self.settings.timeout_secs);
        let output = run_tool(&self.settings.binary, &args, timeout).await?;
        ensure_success("nmap", &output)?;

        let hosts = parse_nmap_xml(&String::from_utf8_lossy(&output.stdout))?;
        info!(target, hosts = hosts.len(), "Nmap service scan finished.");
        Ok(hosts)
    }
}

/// Parses an nmap XML report into one `HostPortInfo` per IPv4 host.
fn parse_nmap_xml(xml: &str) -> Result<Vec<HostPortInfo>> {
    // roxmltree refuses DTDs by default.
    let cleaned: String = xml
        .lines()
        .filter(|line| !line.trim_start().starts_with("<!DOCTYPE"))
        .collect::<Vec<_>>()
        .join("\n");
    let doc = Document::parse(&cleaned)
        .map_err(|e| ScanError::parse(format!("Failed to parse nmap XML: {}", e)))?;

    let root = doc.root_element();
    if root.tag_name().name() != "nmaprun" {
        return Err(ScanError::parse("Invalid nmap XML format"));
    }

    let mut hosts = Vec::new();
    for host in root.children().filter(|n| n.has_tag_name("host")) {
        let Some(ip) = host
            .children()
            .filter(|n| n.has_tag_name("address"))
            .find(|n| n.attribute("addrtype") == Some("ipv4"))
            .and_then(|n| n.attribute("addr"))
        else {
            debug!("Skipping nmap host without an IPv4 address.");
            continue;
        };

        let mut port_info: Vec<PortServiceRecord> = host
            .children()
            .filter(|n| n.has_tag_name("ports"))
            .flat_map(|ports| ports.children().filter(|n| n.has_tag_name("port")))
            .filter_map(|port| parse_port(&port))
            .collect();
        port_info.sort_by_key(|r| r.port);
        port_info.dedup_by_key(|r| r.port);

        hosts.push(HostPortInfo { ip: ip.to_string(), port_info });
    }
    Ok(hosts)
}

fn parse_port(port: &Node) -> Option<PortServiceRecord> {
    let port_id = port
        .attribute("portid")
        .and_then(|p| p.parse::<u16>().ok())
        .filter(|&p| p > 0)?;

    let open = port
        .children()
        .find(|n| n.has_tag_name("state"))
        .and_then(|n| n.attribute("state"))
        .is_none_or(|s| s == "open");
    if !open {
        return None;
    }

    let service = port.children().find(|n| n.has_tag_name("service"));
    let service_name = service
        .and_then(|s| s.attribute("name"))
        .unwrap_or("unknown")
        .to_string();
    let banner = service
        .map(|s| {
            ["product", "version", "extrainfo"]
                .iter()
                .filter_map(|attr| s.attribute(*attr))
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    Some(PortServiceRecord { port: port_id, service: service_name, name: banner })
}
