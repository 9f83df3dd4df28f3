//! Record store: the identifier-keyed collection of facility records
//!
//! A single versioned JSON document holding every facility record keyed by
//! identifier, with a merge-only policy: records are only ever inserted or
//! enriched, never removed. Writes go to a temp file first and are renamed
//! into place, so a crash never leaves a partially-written store on disk.

mod record;

pub use record::{Category, FacilityRecord};

use crate::{Result, StoremapError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Current on-disk document version
const STORE_VERSION: u32 = 1;

/// Outcome of an upsert against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Identifier was absent; record inserted
    Inserted,

    /// Identifier present; one or more previously-empty fields were filled
    Updated,

    /// Identifier present and nothing new to contribute
    Duplicate,
}

/// On-disk envelope for the record store
#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    records: BTreeMap<String, FacilityRecord>,
}

/// Identifier-keyed collection of facility records with a merge-only policy
#[derive(Debug, Default)]
pub struct RecordStore {
    records: BTreeMap<String, FacilityRecord>,
}

impl RecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the store document from disk.
    ///
    /// A missing file yields an empty store (first run). A file that exists
    /// but does not parse is an input format error and aborts the caller
    /// before any write.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)?;
        let document: StoreDocument =
            serde_json::from_str(&content).map_err(|e| StoremapError::InputFormat {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if document.version != STORE_VERSION {
            return Err(StoremapError::InputFormat {
                path: path.to_path_buf(),
                message: format!(
                    "unsupported store version {} (expected {})",
                    document.version, STORE_VERSION
                ),
            });
        }

        Ok(Self {
            records: document.records,
        })
    }

    /// Writes the store document atomically (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let document = StoreDocument {
            version: STORE_VERSION,
            records: self.records.clone(),
        };
        let content = serde_json::to_string_pretty(&document)?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Inserts a new record, or fills gaps on an existing one.
    ///
    /// The identifier is the sole dedup key. For an existing record only
    /// fields that are currently empty are filled; a populated field is
    /// never regressed. Phone follows the same fill-only rule here; the
    /// reconciler's overwrite policy is the one sanctioned exception and
    /// goes through [`set_phone`](Self::set_phone) instead.
    pub fn upsert(&mut self, record: FacilityRecord) -> UpsertOutcome {
        match self.records.get_mut(&record.id) {
            None => {
                self.records.insert(record.id.clone(), record);
                UpsertOutcome::Inserted
            }
            Some(existing) => {
                let mut filled = false;
                let record_has_phone = record.has_phone();

                if existing.name.is_empty() && !record.name.is_empty() {
                    existing.name = record.name;
                    filled = true;
                }
                if existing.address.is_empty() && !record.address.is_empty() {
                    existing.address = record.address;
                    filled = true;
                }
                if existing.city.is_empty() && !record.city.is_empty() {
                    existing.city = record.city;
                    filled = true;
                }
                if existing.state.is_empty() && !record.state.is_empty() {
                    existing.state = record.state;
                    filled = true;
                }
                if !existing.has_phone() && record_has_phone {
                    existing.phone = record.phone;
                    filled = true;
                }

                if filled {
                    UpsertOutcome::Updated
                } else {
                    UpsertOutcome::Duplicate
                }
            }
        }
    }

    /// Overwrites a record's phone. Reconciler use only.
    ///
    /// Returns false when the identifier is absent; enrichment never
    /// manufactures a facility.
    pub fn set_phone(&mut self, id: &str, phone: &str) -> bool {
        match self.records.get_mut(id) {
            Some(record) => {
                record.phone = Some(phone.to_string());
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&FacilityRecord> {
        self.records.get(id)
    }

    pub fn count(&self) -> u64 {
        self.records.len() as u64
    }

    /// Record counts grouped by region code.
    pub fn by_region(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for record in self.records.values() {
            let region = if record.state.is_empty() {
                "Unknown".to_string()
            } else {
                record.state.clone()
            };
            *counts.entry(region).or_insert(0) += 1;
        }
        counts
    }

    /// Number of records with an observed phone.
    pub fn records_with_phone(&self) -> u64 {
        self.records.values().filter(|r| r.has_phone()).count() as u64
    }

    pub fn iter(&self) -> impl Iterator<Item = &FacilityRecord> {
        self.records.values()
    }
}
