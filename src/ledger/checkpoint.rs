//! Ledger state and transitions
//!
//! Invariants, enforced at every persisted checkpoint:
//! - completed ∪ inProgress ∪ pending == declared universe, pairwise disjoint
//! - inProgress holds at most one region (the crawl is single-threaded)
//!
//! Crash recovery favors re-visiting over silent skipping: a stale
//! in-progress region from a previous run is re-queued to pending, which is
//! safe because store upserts are idempotent.

use crate::{Result, StoremapError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const LEDGER_VERSION: u32 = 1;

/// On-disk document; field names match the legacy progress file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerDocument {
    version: u32,
    last_updated: String,
    /// Derived from the record store on persist, recomputed on load.
    /// Never trusted as authoritative on read.
    total_records: u64,
    states_completed: Vec<String>,
    states_in_progress: Vec<String>,
    states_pending: Vec<String>,
}

/// Durable progress state for the crawl
#[derive(Debug, Clone)]
pub struct CheckpointLedger {
    universe: Vec<String>,
    completed: Vec<String>,
    in_progress: Option<String>,
    pending: Vec<String>,
    last_updated: String,
    total_records: u64,
}

impl CheckpointLedger {
    /// Creates a fresh ledger with the whole universe pending.
    pub fn new(universe: Vec<String>) -> Self {
        Self {
            pending: universe.clone(),
            universe,
            completed: Vec::new(),
            in_progress: None,
            last_updated: String::new(),
            total_records: 0,
        }
    }

    /// Loads the ledger from disk, reconciling it against the declared
    /// universe.
    ///
    /// A missing file yields a fresh ledger. Universe regions found in no
    /// set are re-added to pending (never silently dropped); codes outside
    /// the universe are dropped with a warning; a stale in-progress region
    /// is re-queued to pending.
    pub fn load(path: &Path, universe: Vec<String>) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(universe));
        }

        let content = std::fs::read_to_string(path)?;
        let document: LedgerDocument =
            serde_json::from_str(&content).map_err(|e| StoremapError::InputFormat {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if document.version != LEDGER_VERSION {
            return Err(StoremapError::InputFormat {
                path: path.to_path_buf(),
                message: format!(
                    "unsupported ledger version {} (expected {})",
                    document.version, LEDGER_VERSION
                ),
            });
        }

        let in_universe = |code: &String| {
            let known = universe.contains(code);
            if !known {
                tracing::warn!("Dropping unknown region '{}' from ledger", code);
            }
            known
        };

        let completed: Vec<String> = document
            .states_completed
            .into_iter()
            .filter(in_universe)
            .collect();

        let mut pending: Vec<String> = document
            .states_pending
            .into_iter()
            .filter(in_universe)
            .collect();

        // A previous run died mid-region: re-visit rather than skip.
        for code in document.states_in_progress.into_iter().filter(in_universe) {
            tracing::info!("Region '{}' was in progress at last checkpoint, re-queueing", code);
            if !pending.contains(&code) && !completed.contains(&code) {
                pending.push(code);
            }
        }

        // Universe regions the document never mentioned are pending too.
        for code in &universe {
            if !completed.contains(code) && !pending.contains(code) {
                tracing::warn!("Region '{}' missing from ledger, treating as pending", code);
                pending.push(code.clone());
            }
        }

        let mut ledger = Self {
            universe,
            completed,
            in_progress: None,
            pending,
            last_updated: document.last_updated,
            total_records: 0,
        };
        ledger.sort_to_declared_order();
        Ok(ledger)
    }

    /// Writes the ledger atomically. `total_records` is the current record
    /// store count, snapshotted into the document for operators.
    pub fn save(&mut self, path: &Path, total_records: u64) -> Result<()> {
        self.last_updated = Utc::now().to_rfc3339();
        self.total_records = total_records;

        let document = LedgerDocument {
            version: LEDGER_VERSION,
            last_updated: self.last_updated.clone(),
            total_records,
            states_completed: self.completed.clone(),
            states_in_progress: self.in_progress.iter().cloned().collect(),
            states_pending: self.pending.clone(),
        };
        let content = serde_json::to_string_pretty(&document)?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Next pending region in declared order, without mutating state.
    pub fn next_pending(&self) -> Option<&str> {
        self.pending.first().map(String::as_str)
    }

    /// Snapshot of the pending set, in declared order.
    pub fn pending_snapshot(&self) -> Vec<String> {
        self.pending.clone()
    }

    /// Moves a region from pending to in-progress.
    pub fn mark_in_progress(&mut self, code: &str) -> Result<()> {
        if let Some(current) = &self.in_progress {
            return Err(StoremapError::InvariantViolation(format!(
                "cannot start region '{}': region '{}' already in progress",
                code, current
            )));
        }
        let position = self.pending.iter().position(|c| c == code).ok_or_else(|| {
            StoremapError::InvariantViolation(format!("region '{}' is not pending", code))
        })?;
        self.pending.remove(position);
        self.in_progress = Some(code.to_string());
        Ok(())
    }

    /// Moves the in-progress region to completed.
    pub fn mark_completed(&mut self, code: &str) -> Result<()> {
        match self.in_progress.take() {
            Some(current) if current == code => {
                self.completed.push(current);
                Ok(())
            }
            other => {
                self.in_progress = other.clone();
                Err(StoremapError::InvariantViolation(format!(
                    "cannot complete region '{}': in-progress is {:?}",
                    code, other
                )))
            }
        }
    }

    /// Returns the in-progress region to pending (region-level failure path).
    pub fn requeue(&mut self, code: &str) -> Result<()> {
        match self.in_progress.take() {
            Some(current) if current == code => {
                self.pending.push(current);
                self.sort_to_declared_order();
                Ok(())
            }
            other => {
                self.in_progress = other.clone();
                Err(StoremapError::InvariantViolation(format!(
                    "cannot requeue region '{}': in-progress is {:?}",
                    code, other
                )))
            }
        }
    }

    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    pub fn in_progress(&self) -> Option<&str> {
        self.in_progress.as_deref()
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn universe_size(&self) -> usize {
        self.universe.len()
    }

    pub fn last_updated(&self) -> &str {
        &self.last_updated
    }

    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    fn sort_to_declared_order(&mut self) {
        let index: HashMap<&String, usize> = self
            .universe
            .iter()
            .enumerate()
            .map(|(i, code)| (code, i))
            .collect();
        self.pending
            .sort_by_key(|code| index.get(code).copied().unwrap_or(usize::MAX));
    }
}
