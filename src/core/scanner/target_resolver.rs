// src/core/scanner/target_resolver.rs

use crate::core::external::{DnsLookup, LivenessProbe};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Dotted-quad literal with every octet in 0..=255. Leading zeros allowed.
static RE_IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:25[0-5]|2[0-4]\d|[01]?\d?\d)(?:\.(?:25[0-5]|2[0-4]\d|[01]?\d?\d)){3}$").unwrap()
});

pub fn is_ipv4_literal(target: &str) -> bool {
    RE_IPV4.is_match(target)
}

/// Builds the target list from a single value or a list file.
///
/// A list file wins when both are given. Each non-empty line contributes its
/// first whitespace-delimited field; the rest of the line is ignored. A
/// missing file is logged and yields no targets.
pub fn resolve_targets(single: Option<&str>, list_file: Option<&Path>) -> Vec<String> {
    if let Some(path) = list_file {
        return match std::fs::read_to_string(path) {
            Ok(content) => {
                let targets = parse_target_list(&content);
                info!(path = %path.display(), count = targets.len(), "Loaded targets from file.");
                targets
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Target list file cannot be read.");
                Vec::new()
            }
        };
    }
    single.map(|t| vec![t.to_string()]).unwrap_or_default()
}

fn parse_target_list(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Liveness gate and hostname -> address resolution.
pub struct TargetResolver {
    liveness: Arc<dyn LivenessProbe>,
    dns: Arc<dyn DnsLookup>,
}

impl TargetResolver {
    pub fn new(liveness: Arc<dyn LivenessProbe>, dns: Arc<dyn DnsLookup>) -> Self {
        Self { liveness, dns }
    }

    pub async fn is_alive(&self, target: &str) -> bool {
        let alive = self.liveness.is_alive(target).await;
        debug!(target, alive, "Liveness check done.");
        alive
    }

    /// Returns IPv4 literals unchanged; otherwise the first A record, or
    /// `None` on any lookup failure.
    pub async fn resolve_address(&self, target: &str) -> Option<String> {
        if is_ipv4_literal(target) {
            return Some(target.to_string());
        }
        match self.dns.lookup_ipv4(target).await {
            Ok(Some(addr)) => {
                debug!(target, address = %addr, "Resolved target.");
                Some(addr.to_string())
            }
            Ok(None) => {
                warn!(target, "No A record found.");
                None
            }
            Err(e) => {
                warn!(target, error = %e, "DNS lookup failed.");
                None
            }
        }
    }
}
