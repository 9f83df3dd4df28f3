//! Storemap: a resumable facility-directory collector
//!
//! This crate crawls a hierarchical store directory (region → locality →
//! facility), extracts facility records from semi-structured page content,
//! and checkpoints progress so an interrupted run resumes without
//! re-fetching or duplicating work. Secondary paths merge a phone enrichment
//! feed into the record store and report collection completeness.

pub mod config;
pub mod crawler;
pub mod enrich;
pub mod extract;
pub mod import;
pub mod ledger;
pub mod regions;
pub mod report;
pub mod store;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for storemap operations
#[derive(Debug, Error)]
pub enum StoremapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Input format error in {path}: {message}")]
    InputFormat { path: PathBuf, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for storemap operations
pub type Result<T> = std::result::Result<T, StoremapError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use ledger::CheckpointLedger;
pub use store::{Category, FacilityRecord, RecordStore, UpsertOutcome};
