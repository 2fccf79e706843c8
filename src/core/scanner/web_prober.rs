// src/core/scanner/web_prober.rs

use crate::core::external::HttpFetcher;
use crate::core::models::{NO_TITLE, WebInfo};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Non-greedy, spans newlines, case-sensitive.
static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<title>(.*?)</title>").unwrap());

/// Prefixes `http://` unless the target already carries a scheme.
pub fn target_url(domain: &str) -> String {
    if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("http://{}", domain)
    }
}

/// The last non-empty `<title>` in the body, trimmed, or `NO_TITLE`.
pub fn extract_title(body: &str) -> String {
    let mut title = None;
    for caps in RE_TITLE.captures_iter(body) {
        let text = &caps[1];
        if !text.is_empty() {
            title = Some(text.trim().to_string());
        }
    }
    title.unwrap_or_else(|| NO_TITLE.to_string())
}

/// Fetches the web root of a target and records basic metadata.
pub struct WebProber {
    http: Arc<dyn HttpFetcher>,
}

impl WebProber {
    pub fn new(http: Arc<dyn HttpFetcher>) -> Self {
        Self { http }
    }

    /// `None` when the site cannot be fetched or its body is not UTF-8.
    pub async fn probe(&self, domain: &str) -> Option<WebInfo> {
        let url = target_url(domain);
        if let Err(e) = Url::parse(&url) {
            warn!(domain, url = %url, error = %e, "Skipping web probe for malformed URL.");
            return None;
        }
        info!(url = %url, "Fetching web root.");

        let response = match self.http.get(&url).await {
            Ok(r) => r,
            Err(e) => {
                warn!(url = %url, error = %e, "Web probe failed.");
                return None;
            }
        };
        info!(url = %url, status = response.status, "Received HTTP response.");

        let server = response.headers.get("Server").map(str::to_string);
        let language = response.headers.get("X-Powered-By").map(str::to_string);
        if let Some(server) = &server {
            debug!(url = %url, server = %server, "Server header found.");
        }
        if let Some(language) = &language {
            debug!(url = %url, x_powered_by = %language, "X-Powered-By header found.");
        }

        let body = match String::from_utf8(response.body) {
            Ok(b) => b,
            Err(e) => {
                warn!(url = %url, error = %e, "Response body is not valid UTF-8.");
                return None;
            }
        };
        let title = extract_title(&body);
        info!(url = %url, title = %title, "Web probe finished.");

        Some(WebInfo {
            domain: domain.to_string(),
            url,
            title,
            status_code: response.status,
            server,
            language,
            framework: String::new(),
            headers: response.headers,
            body,
        })
    }
}
