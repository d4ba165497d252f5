//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the directory site and run the
//! fetcher, the region controller and the orchestrator end-to-end over HTTP.

use listing_sweep::config::{
    load_config, Config, CrawlerConfig, OutputConfig, RegionEntry, SearchConfig, UserAgentConfig,
};
use listing_sweep::crawler::{
    build_http_client, run_sweep_into, Coordinator, FailureKind, FetchResult, HttpFetcher,
    PageSource, PolitenessLimiter, RetryPolicy, SearchRequest,
};
use listing_sweep::output::{write_all, CsvSink};
use listing_sweep::state::RegionState;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, Respond, ResponseTemplate};

/// Matches on the `page` query parameter; `1` also matches its absence
struct PageIs(u32);

impl Match for PageIs {
    fn matches(&self, request: &Request) -> bool {
        let page = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse::<u32>().ok())
            .unwrap_or(1);
        page == self.0
    }
}

/// Crawler settings with every delay removed
fn fast_crawler() -> CrawlerConfig {
    CrawlerConfig {
        politeness_interval_ms: 0,
        request_timeout_secs: 5,
        connect_timeout_secs: 5,
        max_retries: 2,
        backoff_base_ms: 0,
        backoff_cap_ms: 0,
        rate_limit_cooldown_ms: 0,
        ..CrawlerConfig::default()
    }
}

fn test_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestSweep".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
    }
}

/// Creates a test configuration pointed at the mock server
fn create_test_config(server: &MockServer, regions: &[(&str, usize)]) -> Config {
    Config {
        search: SearchConfig {
            term: "pool cleaning".to_string(),
            base_url: format!("{}/search", server.uri()),
        },
        crawler: fast_crawler(),
        user_agent: test_agent(),
        output: OutputConfig {
            csv_path: "./listings.csv".to_string(),
            summary_path: None,
        },
        regions: regions
            .iter()
            .map(|(code, target)| RegionEntry {
                code: code.to_string(),
                target: *target,
            })
            .collect(),
    }
}

fn create_fetcher(server: &MockServer, crawler: &CrawlerConfig) -> HttpFetcher {
    let client = build_http_client(&test_agent(), crawler).expect("client");
    let base_url = Url::parse(&format!("{}/search", server.uri())).expect("base url");
    HttpFetcher::new(
        client,
        base_url,
        RetryPolicy::from(crawler),
        PolitenessLimiter::new(Duration::ZERO),
    )
}

/// Renders `(name, website, phone, ";"-separated categories)` listings as a
/// result page; a page with listings links to a next page
fn result_page(listings: &[(&str, &str, &str, &str)]) -> String {
    let results: String = listings
        .iter()
        .map(|(name, website, phone, categories)| {
            let website = if website.is_empty() {
                String::new()
            } else {
                format!(r#"<a class="track-visit-website" href="{}">Website</a>"#, website)
            };
            let phone = if phone.is_empty() {
                String::new()
            } else {
                format!(r#"<div class="phones phone primary">{}</div>"#, phone)
            };
            let tags: String = categories
                .split(';')
                .filter(|c| !c.is_empty())
                .map(|c| format!("<a>{}</a>", c))
                .collect();
            format!(
                r#"<div class="result">
                     <a class="business-name" href="/biz"><span>{}</span></a>
                     {}{}<div class="categories">{}</div>
                   </div>"#,
                name, website, phone, tags
            )
        })
        .collect();

    let pagination = if listings.is_empty() {
        ""
    } else {
        r#"<div class="pagination"><a class="next" href="?page=next">Next</a></div>"#
    };

    format!(
        r#"<html><body><div class="search-results organic">{}</div>{}</body></html>"#,
        results, pagination
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

/// Records when each request arrives; the very first one gets a 503, the
/// rest get a one-listing page named after the requested region
struct TimedResponder {
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl Respond for TimedResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut arrivals = self.arrivals.lock().unwrap();
        arrivals.push(Instant::now());
        if arrivals.len() == 1 {
            return ResponseTemplate::new(503);
        }

        let region = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "geo_location_terms")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        let name = format!("{} Pools", region);
        html(result_page(&[(name.as_str(), "", "", "")]))
    }
}

async fn mount_page(server: &MockServer, region: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("geo_location_terms", region))
        .and(PageIs(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_transient_failures_retried_up_to_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let mut fetcher = create_fetcher(&mock_server, &fast_crawler());
    let result = fetcher
        .fetch_page(&SearchRequest::new("pools", "FL", 1))
        .await;

    assert!(matches!(result, FetchResult::HttpError { status_code: 503, .. }));
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut fetcher = create_fetcher(&mock_server, &fast_crawler());
    let result = fetcher
        .fetch_page(&SearchRequest::new("pools", "FL", 1))
        .await;

    assert_eq!(result.status_code(), Some(404));
    assert!(!result.is_success());
}

#[tokio::test]
async fn test_rate_limited_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(result_page(&[("A Pools", "", "", "")])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut fetcher = create_fetcher(&mock_server, &fast_crawler());
    let result = fetcher
        .fetch_page(&SearchRequest::new("pools", "FL", 1))
        .await;

    assert!(result.is_success());
    assert!(result.body().unwrap_or_default().contains("A Pools"));
}

#[tokio::test]
async fn test_rate_limits_share_retry_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&mock_server)
        .await;

    let mut fetcher = create_fetcher(&mock_server, &fast_crawler());
    let result = fetcher
        .fetch_page(&SearchRequest::new("pools", "FL", 1))
        .await;

    assert_eq!(result.status_code(), Some(429));
}

#[tokio::test]
async fn test_non_html_response_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"results": []}"#, "application/json"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut fetcher = create_fetcher(&mock_server, &fast_crawler());
    let result = fetcher
        .fetch_page(&SearchRequest::new("pools", "FL", 1))
        .await;

    assert!(matches!(result, FetchResult::ContentMismatch { .. }));
}

#[tokio::test]
async fn test_timeouts_retried_up_to_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(result_page(&[])).set_delay(Duration::from_secs(3)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let crawler = CrawlerConfig {
        request_timeout_secs: 1,
        max_retries: 1,
        ..fast_crawler()
    };
    let mut fetcher = create_fetcher(&mock_server, &crawler);
    let result = fetcher
        .fetch_page(&SearchRequest::new("pools", "FL", 1))
        .await;

    match result {
        FetchResult::NetworkError { error, failure } => {
            assert_eq!(error, "Request timeout");
            assert_eq!(failure, FailureKind::Transient);
        }
        other => panic!("Expected a timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_politeness_interval_spaces_every_request() {
    let mock_server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(TimedResponder {
            arrivals: Arc::clone(&arrivals),
        })
        .mount(&mock_server)
        .await;

    let interval = Duration::from_millis(300);
    let mut config = create_test_config(&mock_server, &[("FL", 1), ("CA", 1)]);
    config.crawler.politeness_interval_ms = interval.as_millis() as u64;

    let outcome = Coordinator::from_config(&config)
        .expect("Failed to create coordinator")
        .run()
        .await;

    // FL page 1 fails once and is retried, then CA page 1
    let names: Vec<_> = outcome.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["FL Pools", "CA Pools"]);

    let arrivals = arrivals.lock().unwrap();
    assert_eq!(arrivals.len(), 3);
    for pair in arrivals.windows(2) {
        let gap = pair[1].duration_since(pair[0]);
        assert!(gap >= interval, "requests only {:?} apart", gap);
    }
}

#[tokio::test]
async fn test_request_carries_user_agent_and_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("search_terms", "pool cleaning"))
        .and(query_param("geo_location_terms", "MI"))
        .and(query_param("page", "4"))
        .and(wiremock::matchers::header(
            "user-agent",
            "TestSweep/1.0.0 (+https://example.com/contact)",
        ))
        .respond_with(html(result_page(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut fetcher = create_fetcher(&mock_server, &fast_crawler());
    let result = fetcher
        .fetch_page(&SearchRequest::new("pool cleaning", "MI", 4))
        .await;

    assert!(result.is_success());
}

#[tokio::test]
async fn test_region_exhausted_with_shortfall() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "NJ",
        1,
        result_page(&[(
            "A Pools",
            "https://apools.example/",
            "(555) 123-4567",
            "Pool Service",
        )]),
    )
    .await;
    mount_page(&mock_server, "NJ", 2, result_page(&[("B Pools", "", "", "")])).await;
    mount_page(&mock_server, "NJ", 3, result_page(&[])).await;

    let config = create_test_config(&mock_server, &[("NJ", 3)]);
    let outcome = Coordinator::from_config(&config)
        .expect("Failed to create coordinator")
        .run()
        .await;

    assert_eq!(outcome.records.len(), 2);

    let first = &outcome.records[0];
    assert_eq!(first.name, "A Pools");
    assert_eq!(first.website, "https://apools.example/");
    assert_eq!(first.phone, "555-123-4567");
    assert_eq!(first.categories, vec!["Pool Service".to_string()]);
    assert_eq!(first.region, "NJ");

    let second = &outcome.records[1];
    assert_eq!(second.name, "B Pools");
    assert_eq!(second.website, "N/A");
    assert_eq!(second.phone, "");

    let region = &outcome.summary.regions[0];
    assert_eq!(region.state, RegionState::Exhausted);
    assert_eq!(region.actual, 2);
    assert_eq!(region.shortfall(), 1);
    assert_eq!(region.pages_fetched, 3);
}

#[tokio::test]
async fn test_cross_region_duplicate_written_once() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "TX",
        1,
        result_page(&[
            ("Acme Pools", "https://acme.example/", "555-000-1111", "Pool Service"),
            ("Lone Star Pools", "", "555-000-2222", ""),
        ]),
    )
    .await;
    mount_page(
        &mock_server,
        "AZ",
        1,
        result_page(&[
            ("Acme Pools", "https://acme.example/", "(555) 000-1111", "Pool Service"),
            ("Desert Pools", "", "555-000-3333", ""),
        ]),
    )
    .await;
    // Everything past page 1 is the end of results
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(result_page(&[])))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, &[("TX", 10), ("AZ", 10)]);
    let outcome = Coordinator::from_config(&config)
        .expect("Failed to create coordinator")
        .run()
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = dir.path().join("listings.csv");
    let mut sink = CsvSink::create(&csv_path).expect("Failed to create CSV");
    write_all(&mut sink, &outcome.records).expect("Failed to write CSV");
    drop(sink);

    let mut reader = csv::Reader::from_path(&csv_path).expect("Failed to open CSV");
    let rows: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .expect("Failed to read CSV");

    let acme: Vec<_> = rows.iter().filter(|r| &r[0] == "Acme Pools").collect();
    assert_eq!(acme.len(), 1);
    assert_eq!(&acme[0][4], "TX");

    let names: Vec<&str> = rows.iter().map(|r| r.get(0).unwrap_or_default()).collect();
    assert_eq!(names, vec!["Acme Pools", "Lone Star Pools", "Desert Pools"]);
    assert_eq!(outcome.summary.rejected_duplicate, 1);
}

#[tokio::test]
async fn test_failing_region_aborts_and_run_continues() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("geo_location_terms", "FL"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "CA",
        1,
        result_page(&[("Sunset Pools", "", "555-111-2222", "")]),
    )
    .await;
    mount_page(&mock_server, "CA", 2, result_page(&[])).await;

    let mut config = create_test_config(&mock_server, &[("FL", 5), ("CA", 5)]);
    config.crawler.max_retries = 0;

    let outcome = Coordinator::from_config(&config)
        .expect("Failed to create coordinator")
        .run()
        .await;

    let regions = &outcome.summary.regions;
    assert_eq!(regions[0].region, "FL");
    assert_eq!(regions[0].state, RegionState::Aborted);
    assert_eq!(regions[0].actual, 0);
    assert_eq!(regions[1].region, "CA");
    assert_eq!(regions[1].actual, 1);
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn test_sweep_from_config_file() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "FL",
        1,
        result_page(&[
            ("Gulf Pools", "", "555-200-0001", ""),
            ("Keys Pools", "", "555-200-0002", ""),
            ("Bay Pools", "", "555-200-0003", ""),
        ]),
    )
    .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = dir.path().join("sweep.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[search]
term = "pool cleaning"
base-url = "{}/search"

[crawler]
politeness-interval-ms = 0
backoff-base-ms = 0
backoff-cap-ms = 0
rate-limit-cooldown-ms = 0

[user-agent]
crawler-name = "TestSweep"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"

[output]
csv-path = "listings.csv"

[[region]]
code = "FL"
target = 2
"#,
            mock_server.uri()
        ),
    )
    .expect("Failed to write config");

    let config = load_config(&config_path).expect("Failed to load config");
    let mut sink = CsvSink::new(Vec::new()).expect("Failed to open sink");
    let outcome = run_sweep_into(&config, &mut sink)
        .await
        .expect("Sweep failed");

    let names: Vec<_> = outcome.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Gulf Pools", "Keys Pools"]);
    assert_eq!(outcome.summary.regions[0].state, RegionState::Completed);
    assert_eq!(outcome.summary.regions[0].pages_fetched, 1);

    let csv = String::from_utf8(sink.into_inner().expect("Failed to flush sink"))
        .expect("CSV is not UTF-8");
    assert_eq!(
        csv,
        "Name,Website,Phone,Categories,Region\n\
         Gulf Pools,N/A,555-200-0001,,FL\n\
         Keys Pools,N/A,555-200-0002,,FL\n"
    );
}

#[tokio::test]
async fn test_unwritable_output_fails_before_any_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html(result_page(&[])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let missing = dir.path().join("no-such-dir").join("listings.csv");

    // The sink must exist before a sweep can start
    assert!(CsvSink::create(&missing).is_err());
}
