//! Phone enrichment reconciliation
//!
//! Merges an out-of-band phone feed (identifier → phone) into the record
//! store. Enrichment data is higher-fidelity for the phone field than the
//! original crawl, so this is the one path allowed to overwrite a
//! populated phone.

mod reconciler;

pub use reconciler::{load_feed, CoverageStats, EnrichmentFeed, MergeStats, Reconciler};
