//! Storemap command-line interface
//!
//! `run` resumes (or starts) the collection crawl, `enrich` merges a phone
//! feed into the record store, `report` prints completeness against the
//! declared universe of regions.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use storemap::config::load_config_or_default;
use storemap::crawler::Engine;
use storemap::enrich::{load_feed, Reconciler};
use storemap::ledger::CheckpointLedger;
use storemap::regions;
use storemap::report::{build_report, print_report};
use storemap::store::RecordStore;
use tracing_subscriber::EnvFilter;

/// Storemap: a resumable facility-directory collector
#[derive(Parser, Debug)]
#[command(name = "storemap")]
#[command(version)]
#[command(about = "Collects facility records from a store directory", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "storemap.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the collection crawl, resuming from the last checkpoint
    Run,

    /// Merge a phone enrichment feed into the record store
    Enrich {
        /// JSON document mapping facility identifiers to phone numbers
        #[arg(value_name = "FEED")]
        feed: PathBuf,

        /// Report coverage statistics without mutating the store
        #[arg(long)]
        stats_only: bool,
    },

    /// Bootstrap the record store from a CSV export
    Import {
        /// CSV export of the facility network
        #[arg(value_name = "CSV")]
        csv: PathBuf,
    },

    /// Report collection completeness from the persisted state
    Report,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) =
        load_config_or_default(&cli.config).context("failed to load configuration")?;
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    match cli.command {
        Command::Run => handle_run(config).await,
        Command::Enrich { feed, stats_only } => handle_enrich(&config, &feed, stats_only),
        Command::Import { csv } => handle_import(&config, &csv),
        Command::Report => handle_report(&config),
    }
}

/// Maps -v/-q onto an EnvFilter for the tracing subscriber
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("storemap=info,warn"),
            1 => EnvFilter::new("storemap=debug,info"),
            2 => EnvFilter::new("storemap=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// The crawl. Interruption via ctrl-c stops at the next locality boundary
/// and still exits 0: the checkpoint discipline means nothing beyond the
/// in-flight locality is lost.
async fn handle_run(config: storemap::Config) -> anyhow::Result<()> {
    let mut engine = Engine::new(config)?;

    let shutdown = engine.shutdown_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing the in-flight locality");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    let summary = engine.run().await?;

    if summary.interrupted {
        println!("Run interrupted; progress checkpointed. Re-run to resume.");
    }
    println!(
        "Regions completed this run: {} ({} re-queued)",
        summary.regions_completed, summary.regions_requeued
    );
    println!(
        "Records added: {} ({} duplicates skipped, {} localities failed)",
        summary.records_added, summary.duplicates_skipped, summary.localities_failed
    );
    if summary.facility_pages_visited > 0 {
        println!(
            "Facility pages visited for thin cards: {}",
            summary.facility_pages_visited
        );
    }

    Ok(())
}

/// Seeds the store from a CSV export. The merge-only upsert policy means an
/// import never regresses fields the crawl already populated.
fn handle_import(config: &storemap::Config, csv_path: &PathBuf) -> anyhow::Result<()> {
    let store_path = PathBuf::from(&config.output.store_path);
    let mut store = RecordStore::load(&store_path)?;

    let (records, stats) = storemap::import::read_records(csv_path)?;

    let mut inserted = 0u64;
    let mut merged = 0u64;
    for record in records {
        match store.upsert(record) {
            storemap::store::UpsertOutcome::Inserted => inserted += 1,
            storemap::store::UpsertOutcome::Updated => merged += 1,
            storemap::store::UpsertOutcome::Duplicate => {}
        }
    }
    store.save(&store_path)?;

    println!("Rows read:  {} ({} skipped)", stats.rows, stats.skipped);
    println!("Imported:   {} new, {} merged into existing records", inserted, merged);
    println!("Store now holds {} records", store.count());

    Ok(())
}

fn handle_enrich(
    config: &storemap::Config,
    feed_path: &PathBuf,
    stats_only: bool,
) -> anyhow::Result<()> {
    let store_path = PathBuf::from(&config.output.store_path);
    if !store_path.exists() {
        anyhow::bail!(
            "record store {} not found; run the collector first",
            store_path.display()
        );
    }

    let mut store = RecordStore::load(&store_path)?;
    let feed = load_feed(feed_path)?;

    if stats_only {
        let coverage = Reconciler::new(&mut store).coverage();
        println!("Total records:         {}", coverage.total_records);
        println!("Records with phone:    {}", coverage.with_phone);
        println!(
            "Records without phone: {}",
            coverage.total_records - coverage.with_phone
        );
        println!("Phones in feed:        {}", feed.len());
        println!("Coverage:              {:.1}%", coverage.percent());
        return Ok(());
    }

    if feed.is_empty() {
        println!("Enrichment feed is empty. Nothing to merge.");
        return Ok(());
    }

    let mut reconciler = Reconciler::new(&mut store);
    let stats = reconciler.merge(&feed);
    let coverage = reconciler.coverage();

    store.save(&store_path)?;

    println!("Merged:    {} phone numbers", stats.merged);
    println!("Skipped:   {} (already had same phone)", stats.skipped_identical);
    println!("Not found: {} (facility not in store)", stats.not_found);
    println!(
        "Coverage:  {}/{} ({:.1}%)",
        coverage.with_phone,
        coverage.total_records,
        coverage.percent()
    );

    Ok(())
}

fn handle_report(config: &storemap::Config) -> anyhow::Result<()> {
    let ledger_path = PathBuf::from(&config.output.ledger_path);
    if !ledger_path.exists() {
        anyhow::bail!(
            "checkpoint ledger {} not found; run the collector first",
            ledger_path.display()
        );
    }

    let ledger = CheckpointLedger::load(&ledger_path, regions::declared_universe())?;
    let store = RecordStore::load(&PathBuf::from(&config.output.store_path))?;

    let report = build_report(&ledger, &store);
    print_report(&report);

    Ok(())
}
