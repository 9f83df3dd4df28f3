//! The traversal engine
//!
//! Walks pending regions in declared order. Per region: fetch the directory
//! page, enumerate locality URLs, then fetch + extract + upsert per
//! locality, checkpointing after every locality with non-zero yield and
//! after every region-level transition.
//!
//! Failure policy: a locality failure is logged and treated as zero yield;
//! a region-page failure re-queues the region (never silently completed);
//! an invariant violation aborts the run with the last good checkpoint
//! untouched on disk.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchResult};
use crate::extract::{extract_listings, extract_single, facility_ids};
use crate::ledger::CheckpointLedger;
use crate::regions;
use crate::store::{RecordStore, UpsertOutcome};
use crate::Result;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Counters reported at the end of a run
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub regions_completed: u64,
    pub regions_requeued: u64,
    pub localities_visited: u64,
    pub localities_failed: u64,
    pub facility_pages_visited: u64,
    pub records_added: u64,
    pub duplicates_skipped: u64,
    pub interrupted: bool,
}

/// How one region's pass ended
enum RegionOutcome {
    Completed,
    Aborted(String),
}

/// The crawl state machine. Strictly sequential: one locality, one
/// fetch+extract+store, at a time.
pub struct Engine {
    config: Config,
    client: Client,
    store: RecordStore,
    ledger: CheckpointLedger,
    store_path: PathBuf,
    ledger_path: PathBuf,
    shutdown: Arc<AtomicBool>,
}

impl Engine {
    /// Creates an engine over the full declared universe, loading any
    /// previously persisted store and ledger.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_universe(config, regions::declared_universe())
    }

    /// Creates an engine over an explicit universe (tests use a small one).
    pub fn with_universe(config: Config, universe: Vec<String>) -> Result<Self> {
        let store_path = PathBuf::from(&config.output.store_path);
        let ledger_path = PathBuf::from(&config.output.ledger_path);

        let store = RecordStore::load(&store_path)?;
        let ledger = CheckpointLedger::load(&ledger_path, universe)?;

        let client = build_http_client(&config.user_agent, config.crawler.fetch_timeout_secs)?;

        Ok(Self {
            config,
            client,
            store,
            ledger,
            store_path,
            ledger_path,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag checked between localities; setting it stops the run at the
    /// next boundary with at most the in-flight locality lost.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn ledger(&self) -> &CheckpointLedger {
        &self.ledger
    }

    /// Runs the crawl until pending is exhausted or shutdown is requested.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        tracing::info!(
            "Resuming collection: {}/{} regions completed, {} records collected",
            self.ledger.completed().len(),
            self.ledger.universe_size(),
            self.store.count()
        );

        // Snapshot of pending at run start: a region that fails its pass is
        // re-queued for the next run, not retried in a loop within this one.
        let batch = self.ledger.pending_snapshot();
        if batch.is_empty() {
            tracing::info!("Nothing pending, collection is complete");
            return Ok(summary);
        }

        for code in batch {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::info!("Shutdown requested, stopping before region '{}'", code);
                summary.interrupted = true;
                break;
            }

            self.ledger.mark_in_progress(&code)?;
            self.checkpoint()?;

            match self.collect_region(&code, &mut summary).await? {
                RegionOutcome::Completed => {
                    self.ledger.mark_completed(&code)?;
                    self.checkpoint()?;
                    summary.regions_completed += 1;
                    tracing::info!(
                        "{} completed ({}/{} regions, {} records total)",
                        regions::region_name(&code).unwrap_or(code.as_str()),
                        self.ledger.completed().len(),
                        self.ledger.universe_size(),
                        self.store.count()
                    );
                }
                RegionOutcome::Aborted(reason) => {
                    tracing::warn!("Region '{}' pass aborted: {}, re-queueing", code, reason);
                    self.ledger.requeue(&code)?;
                    self.checkpoint()?;
                    summary.regions_requeued += 1;
                    if self.shutdown.load(Ordering::Relaxed) {
                        summary.interrupted = true;
                        break;
                    }
                }
            }
        }

        tracing::info!(
            "Run finished: {} regions completed, {} re-queued, {} records added, \
             {} duplicates skipped, {} localities failed",
            summary.regions_completed,
            summary.regions_requeued,
            summary.records_added,
            summary.duplicates_skipped,
            summary.localities_failed
        );

        Ok(summary)
    }

    /// One region's pass: directory page, then every locality.
    async fn collect_region(
        &mut self,
        code: &str,
        summary: &mut RunSummary,
    ) -> Result<RegionOutcome> {
        let name = regions::region_name(code).unwrap_or(code);
        tracing::info!("=== Collecting {} ({}) ===", name, code.to_uppercase());

        let directory_url = format!(
            "{}{}/{}",
            self.config.crawler.base_url, self.config.crawler.directory_path, code
        );

        // A failure on the region page itself aborts only this region's pass.
        let body = match self.throttled_fetch(&directory_url).await {
            FetchResult::Success { body, .. } => body,
            other => return Ok(RegionOutcome::Aborted(describe_failure(&other))),
        };

        let localities = locality_urls(
            &body,
            &self.config.crawler.base_url,
            &self.config.crawler.directory_path,
            code,
        )?;

        if localities.is_empty() {
            // Not an error: some regions legitimately list nothing.
            tracing::info!("No localities listed for {}", name);
            return Ok(RegionOutcome::Completed);
        }
        tracing::info!("Found {} localities in {}", localities.len(), name);

        for locality_url in localities {
            if self.shutdown.load(Ordering::Relaxed) {
                return Ok(RegionOutcome::Aborted("shutdown requested".to_string()));
            }

            summary.localities_visited += 1;

            let body = match self.throttled_fetch(&locality_url).await {
                FetchResult::Success { body, .. } => body,
                other => {
                    // Skip-and-continue: one locality's failure never
                    // aborts the region.
                    tracing::warn!(
                        "Skipping locality {}: {}",
                        locality_url,
                        describe_failure(&other)
                    );
                    summary.localities_failed += 1;
                    continue;
                }
            };

            let candidates = extract_listings(&body);
            let listed: HashSet<String> = candidates.iter().map(|r| r.id.clone()).collect();
            let mut yielded = 0u64;

            for record in candidates {
                let id = record.id.clone();
                match self.store.upsert(record) {
                    UpsertOutcome::Inserted => {
                        tracing::debug!("Collected facility #{}", id);
                        yielded += 1;
                        summary.records_added += 1;
                    }
                    UpsertOutcome::Updated => {
                        tracing::debug!("Filled missing fields on facility #{}", id);
                        yielded += 1;
                    }
                    UpsertOutcome::Duplicate => {
                        tracing::debug!("Facility #{} already collected, skipping", id);
                        summary.duplicates_skipped += 1;
                    }
                }
            }

            // A card can link to a facility yet fall short of the listing
            // threshold. Visit the facility's own page for those, extracting
            // under the single-page threshold instead.
            for id in facility_ids(&body) {
                if listed.contains(&id) || self.store.get(&id).is_some() {
                    continue;
                }
                if self.shutdown.load(Ordering::Relaxed) {
                    return Ok(RegionOutcome::Aborted("shutdown requested".to_string()));
                }

                let facility_url =
                    format!("{}/store/{}", self.config.crawler.base_url, id);
                summary.facility_pages_visited += 1;

                let page = match self.throttled_fetch(&facility_url).await {
                    FetchResult::Success { body, .. } => body,
                    other => {
                        tracing::warn!(
                            "Skipping facility page {}: {}",
                            facility_url,
                            describe_failure(&other)
                        );
                        continue;
                    }
                };

                match extract_single(&page) {
                    Some(record) => match self.store.upsert(record) {
                        UpsertOutcome::Inserted => {
                            tracing::debug!("Collected facility #{} from its page", id);
                            yielded += 1;
                            summary.records_added += 1;
                        }
                        UpsertOutcome::Updated => {
                            yielded += 1;
                        }
                        UpsertOutcome::Duplicate => {
                            summary.duplicates_skipped += 1;
                        }
                    },
                    None => {
                        tracing::debug!(
                            "Facility page {} below extraction threshold",
                            facility_url
                        );
                    }
                }
            }

            tracing::info!("{}: {} new facility record(s)", locality_url, yielded);

            if yielded > 0 {
                self.checkpoint()?;
            }
        }

        Ok(RegionOutcome::Completed)
    }

    /// Courtesy delay, then fetch. The delay is policy, not correctness,
    /// and is tunable down to zero for tests.
    async fn throttled_fetch(&self, url: &str) -> FetchResult {
        let delay = self.config.crawler.courtesy_delay_ms;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        tracing::debug!("Fetching {}", url);
        fetch_page(&self.client, url).await
    }

    /// Persists both durable structures; the ledger's record count is
    /// derived from the store at this moment.
    fn checkpoint(&mut self) -> Result<()> {
        self.store.save(&self.store_path)?;
        self.ledger.save(&self.ledger_path, self.store.count())?;
        Ok(())
    }
}

/// Derives locality URLs from a region directory page: anchors whose target
/// sits under the region's directory-path prefix, deduplicated in document
/// order.
fn locality_urls(html: &str, base_url: &str, directory_path: &str, code: &str) -> Result<Vec<String>> {
    let base = Url::parse(base_url)?;
    let prefix = format!("{}/{}/", directory_path, code);

    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Ok(Vec::new());
    };

    let mut urls = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        if !resolved.path().starts_with(&prefix) {
            continue;
        }
        let resolved = resolved.to_string();
        if !urls.contains(&resolved) {
            urls.push(resolved);
        }
    }

    Ok(urls)
}

fn describe_failure(result: &FetchResult) -> String {
    match result {
        FetchResult::Success { .. } => "success".to_string(),
        FetchResult::HttpError { status_code } => format!("HTTP {}", status_code),
        FetchResult::Timeout => "request timeout".to_string(),
        FetchResult::NetworkError { error } => error.clone(),
    }
}
