//! End-to-end crawl tests
//!
//! These use wiremock to stand in for the remote directory and exercise the
//! full fetch → extract → store → checkpoint cycle, including resume and
//! failure behavior.

use std::path::PathBuf;
use storemap::config::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use storemap::crawler::Engine;
use storemap::ledger::CheckpointLedger;
use storemap::report::build_report;
use storemap::store::RecordStore;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str, dir: &TempDir) -> Config {
    Config {
        crawler: CrawlerConfig {
            base_url: base_url.to_string(),
            directory_path: "/store-directory".to_string(),
            fetch_timeout_secs: 5,
            courtesy_delay_ms: 0,
        },
        user_agent: UserAgentConfig {
            collector_name: "test-collector".to_string(),
            collector_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            store_path: dir
                .path()
                .join("stores.json")
                .to_string_lossy()
                .into_owned(),
            ledger_path: dir
                .path()
                .join("progress.json")
                .to_string_lossy()
                .into_owned(),
        },
    }
}

fn universe() -> Vec<String> {
    vec!["il".to_string(), "tx".to_string()]
}

fn directory_page(code: &str, cities: &[&str]) -> String {
    let links: String = cities
        .iter()
        .map(|city| format!(r#"<a href="/store-directory/{}/{}">{}</a>"#, code, city, city))
        .collect();
    format!("<html><body><main>{}</main></body></html>", links)
}

fn city_page(cards: &[(&str, &str, &str, &str, &str)]) -> String {
    // (id, category label, street, "City, ST zip", phone)
    let cards: String = cards
        .iter()
        .map(|(id, category, street, csz, phone)| {
            format!(
                r#"<div class="card">
                    <a href="/store/{id}-x">{category} #{id}</a>
                    <div>{street}</div>
                    <div>{csz}</div>
                    <div>{phone}</div>
                </div>"#
            )
        })
        .collect();
    format!("<html><body><main>{}</main></body></html>", cards)
}

async fn mount_page(server: &MockServer, url_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_happy_universe(server: &MockServer) {
    mount_page(
        server,
        "/store-directory/il",
        directory_page("il", &["springfield", "peoria"]),
    )
    .await;
    mount_page(
        server,
        "/store-directory/il/springfield",
        city_page(&[(
            "1234",
            "Walmart Supercenter",
            "100 Main St",
            "Springfield, IL 62701",
            "217-555-0100",
        )]),
    )
    .await;
    mount_page(
        server,
        "/store-directory/il/peoria",
        city_page(&[
            (
                "88",
                "Neighborhood Market",
                "200 Oak Ave",
                "Peoria, IL 61601",
                "309-555-0155",
            ),
            // Same facility linked from two localities: dedup on identifier
            (
                "1234",
                "Walmart Supercenter",
                "100 Main St",
                "Springfield, IL 62701",
                "217-555-0100",
            ),
        ]),
    )
    .await;
    mount_page(
        server,
        "/store-directory/tx",
        directory_page("tx", &["austin"]),
    )
    .await;
    mount_page(
        server,
        "/store-directory/tx/austin",
        city_page(&[(
            "501",
            "Walmart Supercenter",
            "1 Congress Ave",
            "Austin, TX 78701",
            "512-555-0101",
        )]),
    )
    .await;
}

#[tokio::test]
async fn full_crawl_collects_and_completes() {
    let server = MockServer::start().await;
    mount_happy_universe(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &dir);

    let mut engine = Engine::with_universe(config, universe()).unwrap();
    let summary = engine.run().await.unwrap();

    assert_eq!(summary.regions_completed, 2);
    assert_eq!(summary.regions_requeued, 0);
    assert_eq!(summary.records_added, 3);
    assert_eq!(summary.duplicates_skipped, 1);
    assert!(!summary.interrupted);

    let store = engine.store();
    assert_eq!(store.count(), 3);

    let record = store.get("1234").unwrap();
    assert_eq!(record.address, "100 Main St, Springfield, IL 62701");
    assert_eq!(record.state, "IL");
    assert_eq!(record.phone.as_deref(), Some("217-555-0100"));

    let ledger = engine.ledger();
    assert_eq!(ledger.completed(), &["il".to_string(), "tx".to_string()]);
    assert!(ledger.pending().is_empty());
    assert_eq!(ledger.in_progress(), None);
}

#[tokio::test]
async fn rerunning_is_idempotent() {
    let server = MockServer::start().await;
    mount_happy_universe(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &dir);
    let store_path = PathBuf::from(&config.output.store_path);
    let ledger_path = PathBuf::from(&config.output.ledger_path);

    let mut engine = Engine::with_universe(config.clone(), universe()).unwrap();
    engine.run().await.unwrap();
    let first_store = std::fs::read_to_string(&store_path).unwrap();

    // Completed regions are excluded from pending, so a second run fetches
    // nothing and changes nothing.
    let mut engine = Engine::with_universe(config.clone(), universe()).unwrap();
    let summary = engine.run().await.unwrap();
    assert_eq!(summary.records_added, 0);
    assert_eq!(summary.localities_visited, 0);
    assert_eq!(std::fs::read_to_string(&store_path).unwrap(), first_store);

    // Even forcing a re-visit of everything yields the same store contents.
    std::fs::remove_file(&ledger_path).unwrap();
    let mut engine = Engine::with_universe(config, universe()).unwrap();
    let summary = engine.run().await.unwrap();
    assert_eq!(summary.records_added, 0);
    assert_eq!(summary.duplicates_skipped, 4);

    let reread = RecordStore::load(&store_path).unwrap();
    assert_eq!(reread.count(), 3);
    assert_eq!(
        reread.get("1234").unwrap().phone.as_deref(),
        Some("217-555-0100")
    );
}

#[tokio::test]
async fn failed_region_page_requeues_region() {
    let server = MockServer::start().await;
    // Only TX resolves; the IL directory page 404s.
    mount_page(
        &server,
        "/store-directory/tx",
        directory_page("tx", &["austin"]),
    )
    .await;
    mount_page(
        &server,
        "/store-directory/tx/austin",
        city_page(&[(
            "501",
            "Walmart Supercenter",
            "1 Congress Ave",
            "Austin, TX 78701",
            "512-555-0101",
        )]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &dir);
    let ledger_path = PathBuf::from(&config.output.ledger_path);

    let mut engine = Engine::with_universe(config, universe()).unwrap();
    let summary = engine.run().await.unwrap();

    assert_eq!(summary.regions_completed, 1);
    assert_eq!(summary.regions_requeued, 1);

    // The failed region is back in pending at the persisted checkpoint,
    // never marked completed.
    let ledger = CheckpointLedger::load(&ledger_path, universe()).unwrap();
    assert_eq!(ledger.completed(), &["tx".to_string()]);
    assert_eq!(ledger.pending(), &["il".to_string()]);
}

#[tokio::test]
async fn failed_locality_is_skipped_not_fatal() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/store-directory/il",
        directory_page("il", &["springfield", "ghost-town"]),
    )
    .await;
    mount_page(
        &server,
        "/store-directory/il/springfield",
        city_page(&[(
            "1234",
            "Walmart Supercenter",
            "100 Main St",
            "Springfield, IL 62701",
            "217-555-0100",
        )]),
    )
    .await;
    // ghost-town 404s

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &dir);

    let mut engine = Engine::with_universe(config, vec!["il".to_string()]).unwrap();
    let summary = engine.run().await.unwrap();

    assert_eq!(summary.regions_completed, 1);
    assert_eq!(summary.localities_failed, 1);
    assert_eq!(summary.records_added, 1);
    assert_eq!(engine.ledger().completed(), &["il".to_string()]);
}

#[tokio::test]
async fn empty_region_still_completes() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/store-directory/il",
        "<html><body><main></main></body></html>".to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &dir);

    let mut engine = Engine::with_universe(config, vec!["il".to_string()]).unwrap();
    let summary = engine.run().await.unwrap();

    assert_eq!(summary.regions_completed, 1);
    assert_eq!(summary.records_added, 0);
    assert_eq!(engine.ledger().completed(), &["il".to_string()]);
}

#[tokio::test]
async fn thin_card_is_collected_from_facility_page() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/store-directory/il",
        directory_page("il", &["springfield"]),
    )
    .await;
    // The card links to facility #55 but carries no city or phone line,
    // so listing extraction cannot produce a record from it.
    mount_page(
        &server,
        "/store-directory/il/springfield",
        r#"
            <html><body><main><div>
                <a href="/store/55-springfield">Walmart Supercenter #55</a>
                <div>100 Main St</div>
            </div></main></body></html>
        "#
        .to_string(),
    )
    .await;
    mount_page(
        &server,
        "/store/55",
        r#"
            <html><body>
                <h1>Springfield Supercenter</h1>
                <p>Walmart Supercenter #55</p>
                <p>100 Main St, Springfield, IL 62701</p>
                <a href="tel:2175550100">Call store</a>
            </body></html>
        "#
        .to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &dir);

    let mut engine = Engine::with_universe(config, vec!["il".to_string()]).unwrap();
    let summary = engine.run().await.unwrap();

    assert_eq!(summary.facility_pages_visited, 1);
    assert_eq!(summary.records_added, 1);
    assert_eq!(summary.regions_completed, 1);

    let record = engine.store().get("55").unwrap();
    assert_eq!(record.address, "100 Main St, Springfield, IL 62701");
    assert_eq!(record.phone.as_deref(), Some("217-555-0100"));

    // A second run fetches no facility pages: the record is stored.
    std::fs::remove_file(dir.path().join("progress.json")).unwrap();
    let config2 = test_config(&server.uri(), &dir);
    let mut engine = Engine::with_universe(config2, vec!["il".to_string()]).unwrap();
    let summary = engine.run().await.unwrap();
    assert_eq!(summary.facility_pages_visited, 0);
    assert_eq!(summary.records_added, 0);
}

#[test]
fn csv_import_seeds_store_without_regressing_crawl_data() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("stores.json");

    // The crawl already collected #1234 with a phone.
    let mut store = RecordStore::new();
    for record in storemap::extract::extract_listings(&city_page(&[(
        "1234",
        "Walmart Supercenter",
        "100 Main St",
        "Springfield, IL 62701",
        "217-555-0100",
    )])) {
        store.upsert(record);
    }
    store.save(&store_path).unwrap();

    let csv_path = dir.path().join("export.csv");
    std::fs::write(
        &csv_path,
        "businessUnit_number,businessUnit_name,Description,Address,City,State,Postal Code,Operation Status\n\
         1234,Store 1234,Walmart Supercenter,999 Wrong Rd,SPRINGFIELD,IL,62701,Open\n\
         501,Store 501,Walmart Supercenter,1 Congress Ave,AUSTIN,TX,78701,Open\n",
    )
    .unwrap();

    let (records, stats) = storemap::import::read_records(&csv_path).unwrap();
    assert_eq!(stats.imported, 2);

    let mut store = RecordStore::load(&store_path).unwrap();
    for record in records {
        store.upsert(record);
    }
    store.save(&store_path).unwrap();

    let reread = RecordStore::load(&store_path).unwrap();
    assert_eq!(reread.count(), 2);
    // The crawl's address survives the import row for the same facility.
    assert_eq!(
        reread.get("1234").unwrap().address,
        "100 Main St, Springfield, IL 62701"
    );
    assert_eq!(reread.get("1234").unwrap().phone.as_deref(), Some("217-555-0100"));
    // The import contributed the facility the crawl had not reached.
    assert_eq!(reread.get("501").unwrap().city, "Austin");
    assert_eq!(reread.get("501").unwrap().phone, None);
}

#[tokio::test]
async fn crash_resume_revisits_without_duplicating() {
    let server = MockServer::start().await;
    mount_happy_universe(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &dir);
    let store_path = PathBuf::from(&config.output.store_path);
    let ledger_path = PathBuf::from(&config.output.ledger_path);

    // Simulate a crash mid-region: persist a checkpoint with IL in
    // progress and one facility already stored.
    {
        let mut store = RecordStore::new();
        for record in storemap::extract::extract_listings(&city_page(&[(
            "1234",
            "Walmart Supercenter",
            "100 Main St",
            "Springfield, IL 62701",
            "217-555-0100",
        )])) {
            store.upsert(record);
        }
        store.save(&store_path).unwrap();

        let mut ledger = CheckpointLedger::new(universe());
        ledger.mark_in_progress("il").unwrap();
        ledger.save(&ledger_path, store.count()).unwrap();
    }

    // On restart the stale in-progress region is pending again.
    let mut engine = Engine::with_universe(config, universe()).unwrap();
    assert_eq!(engine.ledger().pending(), &["il".to_string(), "tx".to_string()]);

    let summary = engine.run().await.unwrap();
    assert_eq!(summary.regions_completed, 2);
    // #1234 is re-extracted but upsert dedups it.
    assert!(summary.duplicates_skipped >= 1);
    assert_eq!(engine.store().count(), 3);

    let report = build_report(engine.ledger(), engine.store());
    assert!((report.completion_percent - 100.0).abs() < f64::EPSILON);
    assert!(report.partial_regions.is_empty());
}

#[tokio::test]
async fn shutdown_flag_stops_between_regions() {
    let server = MockServer::start().await;
    mount_happy_universe(&server).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server.uri(), &dir);

    let mut engine = Engine::with_universe(config, universe()).unwrap();
    engine
        .shutdown_flag()
        .store(true, std::sync::atomic::Ordering::Relaxed);

    let summary = engine.run().await.unwrap();
    assert!(summary.interrupted);
    assert_eq!(summary.regions_completed, 0);
    // Nothing was silently marked completed.
    assert_eq!(engine.ledger().pending().len(), 2);
}
