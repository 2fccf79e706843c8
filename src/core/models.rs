// src/core/models.rs

use serde::de::{self, DeserializeOwned, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value left in `WebInfo.title` when the page has no non-empty `<title>`.
pub const NO_TITLE: &str = "[]";

// --- Port Scan Models ---

/// One open port as identified by the detailed scanner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortServiceRecord {
    pub port: u16,
    pub service: String,
    /// Banner / product and version string reported by the scanner.
    pub name: String,
}

/// All open ports found for one host by one detailed scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostPortInfo {
    /// Always a dotted-quad address, never a hostname.
    pub ip: String,
    pub port_info: Vec<PortServiceRecord>,
}

impl HostPortInfo {
    pub fn empty(ip: impl Into<String>) -> Self {
        Self { ip: ip.into(), port_info: Vec::new() }
    }
}

/// Host and open ports as reported by the tier-1 sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepHit {
    pub host: String,
    pub open_ports: Vec<u16>,
}

/// Domain -> one `HostPortInfo` per scanned host.
pub type DomainPortResult = BTreeMap<String, Vec<HostPortInfo>>;

// --- Web Models ---

/// Response headers in the order the server sent them.
///
/// Serializes as a plain JSON object so the report never depends on the
/// HTTP client's own header container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields(Vec<(String, String)>);

impl HeaderFields {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a header, folding repeated names into one comma-joined value.
    pub fn append(&mut self, name: &str, value: &str) {
        match self.0.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => self.0.push((name.to_string(), value.to_string())),
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = HeaderFields::new();
        for (k, v) in iter {
            let (k, v): (String, String) = (k.into(), v.into());
            fields.append(&k, &v);
        }
        fields
    }
}

impl Serialize for HeaderFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for HeaderFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = HeaderFields;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of header names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut fields = HeaderFields::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    fields.0.push((k, v));
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

/// Web metadata for one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebInfo {
    pub domain: String,
    pub url: String,
    pub title: String,
    pub status_code: u16,
    pub server: Option<String>,
    /// Taken from the `X-Powered-By` header.
    pub language: Option<String>,
    pub framework: String,
    pub headers: HeaderFields,
    pub body: String,
}

// --- Credential Models ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeakCredentialFinding {
    pub ip: String,
    pub port: u16,
    pub service: String,
    pub username: String,
    #[serde(rename = "passwd")]
    pub password: String,
}

/// What a credential probe reports back for one service instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProbeOutcome {
    pub weak: bool,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub passwd: String,
}

// --- Main Report ---

/// The single document persisted per run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScanReport {
    #[serde(with = "blank_when_empty")]
    pub webinfo: Vec<WebInfo>,
    #[serde(with = "blank_when_empty")]
    pub ip_port_info: DomainPortResult,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weak_password: Vec<WeakCredentialFinding>,
}

/// Collections that may be written as `""` when there is nothing to report.
pub trait Blankable: Default {
    fn is_blank(&self) -> bool;
}

impl<T> Blankable for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<K: Ord, V> Blankable for BTreeMap<K, V> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

/// Writes empty collections as the empty string and reads them back.
mod blank_when_empty {
    use super::*;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize + Blankable,
        S: Serializer,
    {
        if value.is_blank() {
            serializer.serialize_str("")
        } else {
            value.serialize(serializer)
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: DeserializeOwned + Blankable,
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum BlankOr<T> {
            Blank(String),
            Value(T),
        }

        match BlankOr::<T>::deserialize(deserializer)? {
            BlankOr::Value(v) => Ok(v),
            BlankOr::Blank(s) if s.is_empty() => Ok(T::default()),
            BlankOr::Blank(s) => Err(de::Error::custom(format!(
                "expected an empty string or a collection, got {s:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_uses_blank_sentinels() {
        let json = serde_json::to_value(ScanReport::default()).unwrap();
        assert_eq!(json, serde_json::json!({ "webinfo": "", "ip_port_info": "" }));

        let back: ScanReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, ScanReport::default());
    }

    #[test]
    fn header_fields_keep_response_order() {
        let headers: HeaderFields = vec![("Server", "nginx"), ("X-Powered-By", "PHP/8.2"), ("Date", "today")]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&headers).unwrap();
        assert_eq!(json, r#"{"Server":"nginx","X-Powered-By":"PHP/8.2","Date":"today"}"#);

        let back: HeaderFields = serde_json::from_str(&json).unwrap();
        assert_eq!(back, headers);
    }

    #[test]
    fn repeated_headers_are_folded() {
        let mut headers = HeaderFields::new();
        headers.append("set-cookie", "a=1");
        headers.append("Set-Cookie", "b=2");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("SET-COOKIE"), Some("a=1, b=2"));
    }

    #[test]
    fn finding_serializes_passwd_key() {
        let finding = WeakCredentialFinding {
            ip: "10.0.0.5".into(),
            port: 3306,
            service: "mysql".into(),
            username: "root".into(),
            password: String::new(),
        };
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["passwd"], "");
        assert!(json.get("password").is_none());
    }

    #[test]
    fn bare_string_other_than_blank_is_rejected() {
        let doc = r#"{ "webinfo": "nope", "ip_port_info": "" }"#;
        assert!(serde_json::from_str::<ScanReport>(doc).is_err());
    }
}
