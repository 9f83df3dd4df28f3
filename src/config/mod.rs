//! Configuration module
//!
//! Loads, parses and validates the TOML configuration. A missing config
//! file falls back to built-in defaults so the run command needs no flags.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_or_default};
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
