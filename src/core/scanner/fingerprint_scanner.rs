// src/core/scanner/fingerprint_scanner.rs

use crate::config::FingerprintEntry;
use crate::core::models::WebInfo;
use tracing::{debug, info};

/// Labels the web framework of a probed site from its response headers.
///
/// Each header is probed as `name + value` against the table in order. The
/// first token found wins for that header, and every matching header
/// overwrites `framework`, so the last matching header decides the result.
/// Header names compare without case, values with it.
pub fn classify(mut webinfo: WebInfo, table: &[FingerprintEntry]) -> WebInfo {
    if webinfo.headers.is_empty() {
        return webinfo;
    }
    debug!(url = %webinfo.url, headers = webinfo.headers.len(), "Matching header fingerprints.");
    let mut framework = None;
    for (name, value) in webinfo.headers.iter() {
        if let Some(entry) = table.iter().find(|f| header_matches(name, value, &f.token)) {
            debug!(header = name, token = %entry.token, label = %entry.label, "Fingerprint matched.");
            framework = Some(entry.label.clone());
        }
    }
    if let Some(label) = framework {
        info!(url = %webinfo.url, framework = %label, "Web framework identified.");
        webinfo.framework = label;
    }
    webinfo
}

fn header_matches(name: &str, value: &str, token: &str) -> bool {
    format!("{name}{value}").contains(token)
        || name.to_ascii_lowercase().contains(&token.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{HeaderFields, NO_TITLE};

    fn entry(token: &str, label: &str) -> FingerprintEntry {
        FingerprintEntry { token: token.to_string(), label: label.to_string() }
    }

    fn webinfo(headers: &[(&str, &str)]) -> WebInfo {
        WebInfo {
            domain: "example.com".into(),
            url: "http://example.com".into(),
            title: NO_TITLE.into(),
            status_code: 200,
            server: None,
            language: None,
            framework: String::new(),
            headers: headers.iter().copied().collect::<HeaderFields>(),
            body: String::new(),
        }
    }

    #[test]
    fn last_matching_header_wins() {
        let table = [entry("Express", "ExpressJS"), entry("nginx", "nginx-served")];
        let info = classify(webinfo(&[("Server", "nginx"), ("X-Powered-By", "Express")]), &table);
        assert_eq!(info.framework, "ExpressJS");

        let info = classify(webinfo(&[("X-Powered-By", "Express"), ("Server", "nginx")]), &table);
        assert_eq!(info.framework, "nginx-served");
    }

    #[test]
    fn first_token_wins_within_one_header() {
        let table = [entry("PHP", "PHP"), entry("ThinkPHP", "ThinkPHP")];
        let info = classify(webinfo(&[("X-Powered-By", "ThinkPHP")]), &table);
        assert_eq!(info.framework, "PHP");
    }

    #[test]
    fn header_name_is_part_of_the_probe() {
        let table = [entry("X-AspNet-Version", "ASP.NET")];
        let info = classify(webinfo(&[("X-AspNet-Version", "4.0.30319")]), &table);
        assert_eq!(info.framework, "ASP.NET");
    }

    #[test]
    fn header_name_tokens_ignore_case() {
        let table = [entry("X-AspNetMvc-Version", "ASP.NET MVC")];
        let info = classify(webinfo(&[("x-aspnetmvc-version", "5.2")]), &table);
        assert_eq!(info.framework, "ASP.NET MVC");
    }

    #[test]
    fn value_tokens_keep_their_case() {
        let table = [entry("Koa", "Koa")];
        let info = classify(webinfo(&[("Content-Type", "text/html; x=koala")]), &table);
        assert!(info.framework.is_empty());
    }

    #[test]
    fn later_non_matching_headers_do_not_clear_framework() {
        let table = [entry("Express", "ExpressJS")];
        let info = classify(webinfo(&[("X-Powered-By", "Express"), ("Date", "Mon"), ("Vary", "Accept")]), &table);
        assert_eq!(info.framework, "ExpressJS");
    }

    #[test]
    fn no_match_leaves_framework_empty_and_headers_intact() {
        let table = [entry("Express", "ExpressJS")];
        let info = classify(webinfo(&[("Server", "Caddy")]), &table);
        assert!(info.framework.is_empty());
        assert_eq!(serde_json::to_value(&info.headers).unwrap(), serde_json::json!({ "Server": "Caddy" }));
    }
}
