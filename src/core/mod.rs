// src/core/mod.rs

/// Data structures shared by every stage and persisted in the report.
pub mod models;

/// Built-in fingerprint table and common-port list.
pub mod knowledge_base;

pub mod error;

/// Adapters for the external tools and services the scan depends on.
pub mod external;

/// The scanning stages and the coordinator that sequences them.
pub mod scanner;

/// Report assembly and persistence.
pub mod report;
