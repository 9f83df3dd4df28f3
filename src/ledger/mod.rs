//! Checkpoint ledger: durable crawl progress
//!
//! The ledger partitions the declared universe of regions into completed,
//! in-progress and pending sets, and is persisted after every meaningful
//! transition so a crash loses at most one in-flight locality.

mod checkpoint;

pub use checkpoint::CheckpointLedger;
