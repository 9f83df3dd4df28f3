//! Report derivation and printing

use crate::ledger::CheckpointLedger;
use crate::regions;
use crate::store::RecordStore;
use std::collections::BTreeMap;

/// Completeness metrics derived from the ledger and the record store
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub total_records: u64,
    pub by_region: BTreeMap<String, u64>,
    pub completed: Vec<String>,
    pub in_progress: Vec<String>,
    pub pending: Vec<String>,
    pub universe_size: usize,
    pub completion_percent: f64,
    /// Regions with stored records but no completed pass: partial data
    /// from an interrupted run, surfaced rather than hidden.
    pub partial_regions: Vec<String>,
    pub last_updated: String,
}

impl CollectionReport {
    pub fn is_complete(&self) -> bool {
        self.completed.len() == self.universe_size
    }
}

/// Builds the report. Purely derived; performs no fetches.
pub fn build_report(ledger: &CheckpointLedger, store: &RecordStore) -> CollectionReport {
    let by_region = store.by_region();

    let completion_percent = if ledger.universe_size() == 0 {
        0.0
    } else {
        ledger.completed().len() as f64 / ledger.universe_size() as f64 * 100.0
    };

    let partial_regions: Vec<String> = by_region
        .keys()
        .filter(|region| {
            let code = region.to_ascii_lowercase();
            !ledger.completed().contains(&code)
        })
        .cloned()
        .collect();

    CollectionReport {
        total_records: store.count(),
        by_region,
        completed: ledger.completed().to_vec(),
        in_progress: ledger.in_progress().map(str::to_string).into_iter().collect(),
        pending: ledger.pending().to_vec(),
        universe_size: ledger.universe_size(),
        completion_percent,
        partial_regions,
        last_updated: ledger.last_updated().to_string(),
    }
}

/// Prints the report in the operator-facing format.
pub fn print_report(report: &CollectionReport) {
    println!("===========================================");
    println!("  Facility Collection Status");
    println!("===========================================\n");

    if !report.last_updated.is_empty() {
        println!("Last Updated: {}", report.last_updated);
    }
    println!("Total Records Collected: {}\n", report.total_records);

    println!("REGION PROGRESS:");
    println!("  Completed: {}/{}", report.completed.len(), report.universe_size);
    println!("  In Progress: {}", report.in_progress.len());
    println!("  Pending: {}\n", report.pending.len());

    if !report.completed.is_empty() {
        println!("COMPLETED REGIONS:");
        for code in &report.completed {
            println!("  [x] {} ({})", display_name(code), code.to_uppercase());
        }
        println!();
    }

    if !report.in_progress.is_empty() {
        println!("IN PROGRESS:");
        for code in &report.in_progress {
            println!("  [~] {} ({})", display_name(code), code.to_uppercase());
        }
        println!();
    }

    if !report.pending.is_empty() {
        println!("PENDING REGIONS:");
        for code in &report.pending {
            println!("  [ ] {} ({})", display_name(code), code.to_uppercase());
        }
        println!();
    }

    if !report.by_region.is_empty() {
        println!("RECORDS BY REGION:");
        let mut counts: Vec<(&String, &u64)> = report.by_region.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (region, count) in counts {
            println!("  {}: {} records", region, count);
        }
        println!();
    }

    if !report.partial_regions.is_empty() {
        println!("WARNING: regions with records but no completed pass:");
        for region in &report.partial_regions {
            println!("  !! {}", region);
        }
        println!();
    }

    println!("===========================================");
    println!("Overall Progress: {:.1}% of regions completed", report.completion_percent);

    if report.is_complete() {
        println!("\nCOLLECTION COMPLETE! All regions processed.");
    } else {
        println!("\nTo continue collection, run: storemap run");
    }
}

fn display_name(code: &str) -> &str {
    regions::region_name(code).unwrap_or(code)
}
