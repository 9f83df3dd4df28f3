//! Merge logic and statistics for the enrichment feed

use crate::store::RecordStore;
use crate::{Result, StoremapError};
use std::collections::BTreeMap;
use std::path::Path;

/// The enrichment feed: facility identifier → phone string. Consumed
/// read-only; the feed file is never rewritten.
pub type EnrichmentFeed = BTreeMap<String, String>;

/// Counts from one merge pass. `merged + skipped_identical + not_found`
/// always equals the feed size.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    /// Phone written (new or different from the stored one)
    pub merged: u64,

    /// Record already carried the identical phone
    pub skipped_identical: u64,

    /// Identifier absent from the store; no record manufactured
    pub not_found: u64,
}

impl MergeStats {
    pub fn total(&self) -> u64 {
        self.merged + self.skipped_identical + self.not_found
    }
}

/// Phone coverage of the store, for the stats-only mode.
#[derive(Debug, Clone, Copy)]
pub struct CoverageStats {
    pub total_records: u64,
    pub with_phone: u64,
}

impl CoverageStats {
    pub fn percent(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            self.with_phone as f64 / self.total_records as f64 * 100.0
        }
    }
}

/// Loads the enrichment feed document. A parse failure aborts before any
/// write happens anywhere.
pub fn load_feed(path: &Path) -> Result<EnrichmentFeed> {
    let content = std::fs::read_to_string(path).map_err(|e| StoremapError::InputFormat {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| StoremapError::InputFormat {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Reconciles the enrichment feed against a record store
pub struct Reconciler<'a> {
    store: &'a mut RecordStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a mut RecordStore) -> Self {
        Self { store }
    }

    /// Merges every feed entry. Absent identifiers are counted and left
    /// alone; identical phones are counted and skipped; anything else
    /// overwrites the stored phone.
    pub fn merge(&mut self, feed: &EnrichmentFeed) -> MergeStats {
        let mut stats = MergeStats::default();

        for (id, phone) in feed {
            match self.store.get(id) {
                None => {
                    tracing::debug!("Feed entry for unknown facility #{}", id);
                    stats.not_found += 1;
                }
                Some(record) if record.phone.as_deref() == Some(phone.as_str()) => {
                    stats.skipped_identical += 1;
                }
                Some(_) => {
                    self.store.set_phone(id, phone);
                    stats.merged += 1;
                }
            }
        }

        stats
    }

    /// Coverage without mutation, for `--stats-only`.
    pub fn coverage(&self) -> CoverageStats {
        CoverageStats {
            total_records: self.store.count(),
            with_phone: self.store.records_with_phone(),
        }
    }
}
