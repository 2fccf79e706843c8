// src/config.rs

use crate::core::error::{Result, ScanError};
use crate::core::knowledge_base::{COMMON_PORTS, FINGERPRINTS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime settings, loaded from an optional TOML file.
///
/// Every field has a default, so an empty file (or no file at all) gives the
/// built-in behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ports for the detailed scan when no full sweep is requested.
    pub common_ports: Vec<u16>,
    /// Ordered header fingerprint table.
    pub fingerprints: Vec<FingerprintEntry>,
    pub http_timeout_secs: u64,
    pub ping_timeout_secs: u64,
    /// Budget for the whole chain of a single target.
    pub domain_timeout_secs: u64,
    pub workers: usize,
    pub output_dir: PathBuf,
    pub masscan: MasscanSettings,
    pub nmap: NmapSettings,
    pub probes: ProbeSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintEntry {
    pub token: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MasscanSettings {
    pub binary: String,
    pub rate: u32,
    pub ports: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NmapSettings {
    pub binary: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Directory holding the `<service>_weak` probe executables.
    pub script_dir: PathBuf,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            common_ports: COMMON_PORTS.to_vec(),
            fingerprints: FINGERPRINTS
                .iter()
                .map(|f| FingerprintEntry { token: f.token.to_string(), label: f.label.to_string() })
                .collect(),
            http_timeout_secs: 3,
            ping_timeout_secs: 1,
            domain_timeout_secs: 3600,
            workers: 8,
            output_dir: PathBuf::from("output"),
            masscan: MasscanSettings::default(),
            nmap: NmapSettings::default(),
            probes: ProbeSettings::default(),
        }
    }
}

impl Default for MasscanSettings {
    fn default() -> Self {
        Self {
            binary: "masscan".to_string(),
            rate: 1000,
            ports: "1-65535".to_string(),
            timeout_secs: 3600,
        }
    }
}

impl Default for NmapSettings {
    fn default() -> Self {
        Self { binary: "nmap".to_string(), timeout_secs: 1800 }
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self { script_dir: PathBuf::from("scripts/weak"), timeout_secs: 60 }
    }
}

impl Settings {
    pub const MAX_WORKERS: usize = 64;

    /// Loads settings from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScanError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| ScanError::Config(format!("Failed to parse config: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.common_ports.is_empty() {
            return Err(ScanError::Config("common_ports cannot be empty".to_string()));
        }
        if self.common_ports.contains(&0) {
            return Err(ScanError::Config("common_ports cannot contain port 0".to_string()));
        }
        if self.fingerprints.iter().any(|f| f.token.is_empty()) {
            return Err(ScanError::Config("fingerprint tokens cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Worker count clamped to a sane range.
    pub fn worker_count(&self) -> usize {
        self.workers.clamp(1, Self::MAX_WORKERS)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs)
    }

    pub fn domain_timeout(&self) -> Duration {
        Duration::from_secs(self.domain_timeout_secs)
    }
}
