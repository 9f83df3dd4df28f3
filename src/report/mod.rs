//! Completeness verification
//!
//! Derives a collection report from the two persisted structures. No
//! fetches, no writes.

mod verifier;

pub use verifier::{build_report, print_report, CollectionReport};
