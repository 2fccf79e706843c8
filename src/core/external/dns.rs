// src/core/external/dns.rs

use super::DnsLookup;
use crate::core::error::{Result, ScanError};
use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use std::net::Ipv4Addr;
use tracing::{debug, warn};

/// A-record lookups through the system resolver configuration.
pub struct HickoryDns {
    resolver: TokioAsyncResolver,
}

impl HickoryDns {
    pub fn new() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            warn!(error = %e, "System resolver config unavailable, using defaults.");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver }
    }
}

#[async_trait]
impl DnsLookup for HickoryDns {
    async fn lookup_ipv4(&self, name: &str) -> Result<Option<Ipv4Addr>> {
        debug!(name, "Looking up A record.");
        match self.resolver.ipv4_lookup(name).await {
            // Only the first answer is used; no preference between records.
            Ok(answers) => Ok(answers.iter().next().map(|a| a.0)),
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => Ok(None),
                _ => Err(ScanError::external_tool("dns", e.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn nonexistent_name_never_yields_an_address() {
        let dns = HickoryDns::new();
        let result = dns.lookup_ipv4("webfind-7f3a9c2e1b.invalid").await;
        assert!(!matches!(result, Ok(Some(_))));
    }
}
