// src/core/external/http.rs

use super::{HttpFetcher, HttpResponse};
use crate::core::error::{Result, ScanError};
use crate::core::models::HeaderFields;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// `reqwest`-backed fetcher with a fixed per-request timeout.
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("webfind-rs/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ScanError::Http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    #[cfg(test)]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ScanError::Http(format!("request to {} timed out", url))
            } else {
                ScanError::Http(format!("request to {} failed: {}", url, e))
            }
        })?;

        let status = response.status().as_u16();
        let mut headers = HeaderFields::new();
        for (name, value) in response.headers() {
            // Non-UTF-8 values are kept in lossy form rather than dropped.
            let value = String::from_utf8_lossy(value.as_bytes());
            headers.append(&canonical_name(name.as_str()), &value);
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| ScanError::Http(format!("failed to read body from {}: {}", url, e)))?;
        debug!(url, status, bytes = body.len(), "HTTP response received.");

        Ok(HttpResponse { status, headers, body: body.to_vec() })
    }
}

/// `x-powered-by` -> `X-Powered-By`. The HTTP stack hands names over
/// lowercased; reports show them in their conventional form.
fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
