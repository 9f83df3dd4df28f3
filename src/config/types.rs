use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Root of the directory site, no trailing slash
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path prefix of the region directory pages
    #[serde(rename = "directory-path")]
    pub directory_path: String,

    /// Per-request timeout in seconds
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Courtesy delay between successive fetches, milliseconds. Zero is
    /// allowed (tests run unthrottled).
    #[serde(rename = "courtesy-delay-ms")]
    pub courtesy_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.walmart.com".to_string(),
            directory_path: "/store-directory".to_string(),
            fetch_timeout_secs: 30,
            courtesy_delay_ms: 1500,
        }
    }
}

/// Collector identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(rename = "collector-name")]
    pub collector_name: String,

    #[serde(rename = "collector-version")]
    pub collector_version: String,

    #[serde(rename = "contact-url")]
    pub contact_url: String,

    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            collector_name: "storemap".to_string(),
            collector_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/storemap".to_string(),
            contact_email: "operator@example.com".to_string(),
        }
    }
}

/// Durable file locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Record store document
    #[serde(rename = "store-path")]
    pub store_path: String,

    /// Checkpoint ledger document
    #[serde(rename = "ledger-path")]
    pub ledger_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            store_path: "./stores.json".to_string(),
            ledger_path: "./collection-progress.json".to_string(),
        }
    }
}
