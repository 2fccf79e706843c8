// src/core/error.rs

use std::io;

/// Errors raised by the scanning core.
///
/// None of these abort a run on their own: the pipeline catches them at the
/// per-target boundary and turns them into log lines. Only configuration and
/// output failures make it out to `main`.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External tool error: {tool} failed with {message}")]
    ExternalTool { tool: String, message: String },

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Timeout error: operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("No probe registered for '{0}'")]
    ProbeNotRegistered(String),

    #[error("Probe error: {service} probe failed with {message}")]
    Probe { service: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanError {
    pub fn external_tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn probe(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Probe {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout {
            duration_ms: duration.as_millis() as u64,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
