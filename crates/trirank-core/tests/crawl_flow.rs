//! Integration tests for the crawl flow
//!
//! These tests run the full traversal against a wiremock server: the
//! mock expectations double as proof of the at-most-once remote-call
//! property, since the cache must absorb every repeated request.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use trirank_core::{
    CacheConfig, CachedFetcher, ClientConfig, CrawlOptions, Crawler, CsvExporter, HttpCache,
    MemoryBackend, RankingsClient, RankingsScraper,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Events page with one year, one race type and one state, so the
/// search space is the single tuple (2021, "1", "840", "CA").
fn events_page() -> &'static str {
    concat!(
        "<html><body><form>",
        "<input id=\"YearsSource\" type=\"hidden\" value=\"[2021]\"/>",
        "<input id=\"RaceTypesSource\" type=\"hidden\" ",
        "value='[{\"RaceTypeId\":\"1\",\"Value\":\"Triathlon\"}]'/>",
        "<input id=\"StatesSource\" type=\"hidden\" ",
        "value='[{\"StateId\":\"CA\",\"StateName\":\"California\",\"CountryId\":\"840\"}]'/>",
        "</form></body></html>",
    )
}

fn race_list_page(race_ids: &[&str]) -> String {
    let items: String = race_ids
        .iter()
        .map(|id| format!("<li class=\"raceLink\" raceid=\"{}\">Race {}</li>", id, id))
        .collect();
    format!("<html><body><ul id=\"racesList\">{}</ul></body></html>", items)
}

/// Build a crawler against the mock server, with a zero rate-limit
/// interval and a shared in-memory cache backend.
fn crawler(server_uri: &str, backend: Arc<MemoryBackend>, output_root: &Path) -> Crawler {
    let client = RankingsClient::with_config(ClientConfig {
        base_url: server_uri.to_string(),
        min_interval: Duration::ZERO,
        ..ClientConfig::default()
    })
    .expect("client");

    let cache = HttpCache::new(backend, CacheConfig::default());
    let scraper = RankingsScraper::new(CachedFetcher::new(client, cache));
    Crawler::new(scraper, CsvExporter::new(output_root))
}

/// Mount the happy-path mocks: two events for the single search tuple,
/// event 100 hosting race 55 (no results table), event 200 hosting
/// race 77 (results present). Every endpoint expects exactly one hit.
async fn mount_happy_path(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/Event/Events"))
        .respond_with(ResponseTemplate::new(200).set_body_string(events_page()))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/Event/List"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"EventId":"100","EventName":"Spring Sprint"},
                {"EventId":"200","EventName":"Fall Classic"}]"#,
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Event/ViewEvent/100"))
        .respond_with(ResponseTemplate::new(200).set_body_string(race_list_page(&["55"])))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Event/ViewEvent/200"))
        .respond_with(ResponseTemplate::new(200).set_body_string(race_list_page(&["77"])))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/Race/GetRaceData/"))
        .and(body_partial_json(serde_json::json!({"RaceId": "55"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"Race":{"RaceId":55,"RaceType":"Triathlon","ResultsType":""}}"#,
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/Race/GetRaceData/"))
        .and(body_partial_json(serde_json::json!({"RaceId": "77"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"Race":{"RaceId":77,"RaceType":"Triathlon","ResultsType":"AgeGroup"}}"#,
        ))
        .expect(1)
        .mount(server)
        .await;

    // Only race 77 has a results table; race 55 must never reach here.
    Mock::given(method("POST"))
        .and(path("/RaceResult/GetResults/"))
        .and(body_partial_json(serde_json::json!({"RaceId": "77"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"Results":"[{\"Name\":\"Jane\",\"Time\":\"01:00:00\"},{\"Name\":\"Ada\",\"Time\":\"01:05:00\"}]"}"#,
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/RaceResult/GetResults/"))
        .and(body_partial_json(serde_json::json!({"RaceId": "55"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Results":"[]"}"#))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_writes_hierarchy() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;

    let output = tempfile::tempdir().unwrap();
    let backend = Arc::new(MemoryBackend::new());
    let crawler = crawler(&server.uri(), backend, output.path());

    let stats = crawler.run(&CrawlOptions::default()).await.unwrap();

    assert_eq!(stats.search_tuples, 1);
    assert_eq!(stats.events, 2);
    assert_eq!(stats.races, 2);
    assert_eq!(stats.results, 1);
    assert_eq!(stats.races_without_results, 1);
    assert_eq!(stats.branch_errors, 0);

    let root = output.path();
    let event_csv = root.join("2021/840/CA/100/event.csv");
    assert!(event_csv.exists());
    let contents = std::fs::read_to_string(&event_csv).unwrap();
    assert_eq!(contents, "EventId,EventName\n100,Spring Sprint\n");

    // Race 55 has metadata but no results file.
    assert!(root.join("2021/840/CA/100/Triathlon/55/race.csv").exists());
    assert!(!root.join("2021/840/CA/100/Triathlon/55/results.csv").exists());

    // Race 77 has both.
    assert!(root.join("2021/840/CA/200/Triathlon/77/race.csv").exists());
    let results = std::fs::read_to_string(root.join("2021/840/CA/200/Triathlon/77/results.csv"))
        .unwrap();
    assert_eq!(results, "Name,Time\nJane,01:00:00\nAda,01:05:00\n");
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let server = MockServer::start().await;
    mount_happy_path(&server).await;

    let output = tempfile::tempdir().unwrap();
    let backend = Arc::new(MemoryBackend::new());

    // Two independent crawler instances sharing the cache store, like
    // a crawl retried in a fresh process against the same backend.
    let first = crawler(&server.uri(), backend.clone(), output.path());
    let first_stats = first.run(&CrawlOptions::default()).await.unwrap();

    let second = crawler(&server.uri(), backend, output.path());
    let second_stats = second.run(&CrawlOptions::default()).await.unwrap();

    // Same work from the traversal's point of view, zero extra remote
    // calls: the expect(1) mounts verify on server drop.
    assert_eq!(first_stats, second_stats);
}

#[tokio::test]
async fn test_year_filter_restricts_search_space() {
    let server = MockServer::start().await;

    let two_year_page = concat!(
        "<html><body><form>",
        "<input id=\"YearsSource\" type=\"hidden\" value=\"[2021,2020]\"/>",
        "<input id=\"RaceTypesSource\" type=\"hidden\" ",
        "value='[{\"RaceTypeId\":\"1\",\"Value\":\"Triathlon\"}]'/>",
        "<input id=\"StatesSource\" type=\"hidden\" ",
        "value='[{\"StateId\":\"CA\",\"StateName\":\"California\",\"CountryId\":\"840\"}]'/>",
        "</form></body></html>",
    );

    Mock::given(method("GET"))
        .and(path("/Event/Events"))
        .respond_with(ResponseTemplate::new(200).set_body_string(two_year_page))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/Event/List"))
        .and(body_partial_json(serde_json::json!({"Year": 2021})))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/Event/List"))
        .and(body_partial_json(serde_json::json!({"Year": 2020})))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(0)
        .mount(&server)
        .await;

    let output = tempfile::tempdir().unwrap();
    let crawler = crawler(&server.uri(), Arc::new(MemoryBackend::new()), output.path());

    let stats = crawler
        .run(&CrawlOptions { year: Some(2021) })
        .await
        .unwrap();
    assert_eq!(stats.search_tuples, 1);
    assert_eq!(stats.events, 0);
}

#[tokio::test]
async fn test_failed_branch_does_not_abort_crawl() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Event/Events"))
        .respond_with(ResponseTemplate::new(200).set_body_string(events_page()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/Event/List"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"EventId":"100","EventName":"Broken"},
                {"EventId":"200","EventName":"Healthy"}]"#,
        ))
        .mount(&server)
        .await;

    // Event 100's detail page is down; its branch must be abandoned
    // without stopping the crawl.
    Mock::given(method("GET"))
        .and(path("/Event/ViewEvent/100"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Event/ViewEvent/200"))
        .respond_with(ResponseTemplate::new(200).set_body_string(race_list_page(&[])))
        .mount(&server)
        .await;

    let output = tempfile::tempdir().unwrap();
    let crawler = crawler(&server.uri(), Arc::new(MemoryBackend::new()), output.path());

    let stats = crawler.run(&CrawlOptions::default()).await.unwrap();

    assert_eq!(stats.events, 2);
    assert_eq!(stats.branch_errors, 1);
    assert!(output.path().join("2021/840/CA/100/event.csv").exists());
    assert!(output.path().join("2021/840/CA/200/event.csv").exists());
}
