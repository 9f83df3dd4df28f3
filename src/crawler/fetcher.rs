//! HTTP fetcher
//!
//! Builds the HTTP client with a descriptive user agent and classifies
//! every fetch into a [`FetchResult`]. Fetches are fallible I/O and never
//! assumed to succeed; the engine decides skip/retry/advance based on the
//! classification.

use crate::config::UserAgentConfig;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Result of fetching one page
#[derive(Debug)]
pub enum FetchResult {
    /// 2xx with body text
    Success { status_code: u16, body: String },

    /// Non-success HTTP status
    HttpError { status_code: u16 },

    /// Request timed out
    Timeout,

    /// Connection-level failure (refused, DNS, TLS)
    NetworkError { error: String },
}

/// Builds an HTTP client with the configured identity and timeouts.
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    // Format: CollectorName/Version (+ContactURL; ContactEmail)
    let agent = format!(
        "{}/{} (+{}; {})",
        user_agent.collector_name,
        user_agent.collector_version,
        user_agent.contact_url,
        user_agent.contact_email
    );

    Client::builder()
        .user_agent(agent)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome.
pub async fn fetch_page(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();

            if !status.is_success() {
                if status == StatusCode::TOO_MANY_REQUESTS {
                    tracing::warn!("Rate limited fetching {}", url);
                }
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchResult::Success {
                    status_code: status.as_u16(),
                    body,
                },
                Err(e) => FetchResult::NetworkError {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            if e.is_timeout() {
                FetchResult::Timeout
            } else {
                FetchResult::NetworkError {
                    error: e.to_string(),
                }
            }
        }
    }
}
