//! Traversal engine: the crawl state machine
//!
//! One sequential worker walks region → locality → facility, driving
//! fetch + extract + store + checkpoint per unit of work. All suspension
//! points are fetch boundaries and the courtesy delay.

mod engine;
mod fetcher;

pub use engine::{Engine, RunSummary};
pub use fetcher::{build_http_client, fetch_page, FetchResult};
