//! Integration tests for the crawler
//!
//! Each test builds a small site in the stub backend, runs a complete
//! crawl, and inspects the committed output directory and the raw
//! index.json.

use docrawl::config::{validate_options, CrawlOptions};
use docrawl::fetch::StubFetcher;
use docrawl::{crawl, Crawler, DocrawlError};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Options for a stub-backed crawl into `tmp`, robots and delays off
fn stub_options(tmp: &TempDir, url: &str) -> CrawlOptions {
    CrawlOptions {
        url: url.to_string(),
        output_dir: tmp.path().join("docs-out"),
        delay_ms: 0,
        wait_ms: 0,
        respect_robots: false,
        ..CrawlOptions::default()
    }
}

async fn run_crawl(options: CrawlOptions, stub: StubFetcher) -> docrawl::CrawlOutcome {
    let config = validate_options(options).expect("options should validate");
    crawl(config, Box::new(stub))
        .await
        .expect("crawl should complete")
}

fn read_index(output_dir: &Path) -> Value {
    let raw = std::fs::read_to_string(output_dir.join("index.json"))
        .expect("index.json should exist");
    serde_json::from_str(&raw).expect("index.json should parse")
}

fn page_html(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!(
        "<html><head><title>Page</title></head><body><main><h1>Page</h1><p>Body text.</p>{}</main></body></html>",
        anchors
    )
}

#[tokio::test]
async fn test_depth_zero_crawls_only_start_page() {
    let tmp = TempDir::new().unwrap();
    let stub = StubFetcher::new().with_page(
        "https://docs.test/",
        &page_html(&["/guide", "/reference"]),
    );

    let options = CrawlOptions {
        max_depth: 0,
        ..stub_options(&tmp, "https://docs.test/")
    };
    let outcome = run_crawl(options, stub).await;

    assert_eq!(outcome.stats.pages, 1);
    let index = read_index(&outcome.output_dir);
    assert_eq!(index["totalPages"], 1);
    assert_eq!(index["pages"][0]["url"], "https://docs.test/");
    assert_eq!(index["pages"][0]["depth"], 0);
}

#[tokio::test]
async fn test_mutually_linked_pages_fetched_once_each() {
    let tmp = TempDir::new().unwrap();
    let stub = StubFetcher::new()
        .with_page("https://docs.test/", &page_html(&["/a"]))
        .with_page("https://docs.test/a", &page_html(&["/b", "/"]))
        .with_page("https://docs.test/b", &page_html(&["/a", "/"]));
    let log = stub.log_handle();

    let outcome = run_crawl(stub_options(&tmp, "https://docs.test/"), stub).await;

    assert_eq!(outcome.stats.pages, 3);
    let fetched = &log.lock().unwrap().fetched;
    assert_eq!(fetched.len(), 3);
    for url in ["https://docs.test/", "https://docs.test/a", "https://docs.test/b"] {
        assert_eq!(fetched.iter().filter(|f| f.as_str() == url).count(), 1);
    }
}

#[tokio::test]
async fn test_traversal_is_depth_first() {
    let tmp = TempDir::new().unwrap();
    let stub = StubFetcher::new()
        .with_page("https://docs.test/", &page_html(&["/b", "/c"]))
        .with_page("https://docs.test/b", &page_html(&["/d"]))
        .with_page("https://docs.test/c", &page_html(&[]))
        .with_page("https://docs.test/d", &page_html(&[]));
    let log = stub.log_handle();

    run_crawl(stub_options(&tmp, "https://docs.test/"), stub).await;

    // b's subtree completes before c is touched
    assert_eq!(
        log.lock().unwrap().fetched,
        vec![
            "https://docs.test/",
            "https://docs.test/b",
            "https://docs.test/d",
            "https://docs.test/c",
        ]
    );
}

#[tokio::test]
async fn test_max_depth_bounds_traversal() {
    let tmp = TempDir::new().unwrap();
    let stub = StubFetcher::new()
        .with_page("https://docs.test/", &page_html(&["/a"]))
        .with_page("https://docs.test/a", &page_html(&["/deep"]))
        .with_page("https://docs.test/deep", &page_html(&[]));
    let log = stub.log_handle();

    let options = CrawlOptions {
        max_depth: 1,
        ..stub_options(&tmp, "https://docs.test/")
    };
    let outcome = run_crawl(options, stub).await;

    assert_eq!(outcome.stats.pages, 2);
    assert!(!log
        .lock()
        .unwrap()
        .fetched
        .contains(&"https://docs.test/deep".to_string()));
}

#[tokio::test]
async fn test_max_pages_stops_after_limit() {
    let tmp = TempDir::new().unwrap();
    let stub = StubFetcher::new()
        .with_page("https://docs.test/", &page_html(&["/a", "/b", "/c"]))
        .with_page("https://docs.test/a", &page_html(&[]))
        .with_page("https://docs.test/b", &page_html(&[]))
        .with_page("https://docs.test/c", &page_html(&[]));

    let options = CrawlOptions {
        max_pages: Some(2),
        ..stub_options(&tmp, "https://docs.test/")
    };
    let outcome = run_crawl(options, stub).await;

    assert_eq!(outcome.stats.pages, 2);
    let index = read_index(&outcome.output_dir);
    assert_eq!(index["totalPages"], 2);
    assert_eq!(index["pages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_robots_disallow_blocks_page_fetch() {
    let tmp = TempDir::new().unwrap();
    let stub = StubFetcher::new()
        .with_resource(
            "https://docs.test/robots.txt",
            "User-agent: *\nDisallow: /admin/\nAllow: /admin/public/",
            "text/plain",
        )
        .with_page(
            "https://docs.test/",
            &page_html(&["/admin/private", "/admin/public/x"]),
        )
        .with_page("https://docs.test/admin/private", &page_html(&[]))
        .with_page("https://docs.test/admin/public/x", &page_html(&[]));
    let log = stub.log_handle();

    let options = CrawlOptions {
        respect_robots: true,
        ..stub_options(&tmp, "https://docs.test/")
    };
    let outcome = run_crawl(options, stub).await;

    assert_eq!(outcome.stats.pages, 2);
    let fetched = &log.lock().unwrap().fetched;
    assert!(!fetched.contains(&"https://docs.test/admin/private".to_string()));
    assert!(fetched.contains(&"https://docs.test/admin/public/x".to_string()));
    // robots.txt fetched once for the origin
    assert_eq!(
        fetched
            .iter()
            .filter(|f| f.as_str() == "https://docs.test/robots.txt")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_fetch_failure_skips_page_and_continues() {
    let tmp = TempDir::new().unwrap();
    let stub = StubFetcher::new()
        .with_page("https://docs.test/", &page_html(&["/broken", "/fine"]))
        .with_failure("https://docs.test/broken")
        .with_page("https://docs.test/fine", &page_html(&[]));

    let outcome = run_crawl(stub_options(&tmp, "https://docs.test/"), stub).await;

    assert_eq!(outcome.stats.pages, 2);
    assert_eq!(outcome.stats.errors, 1);
}

#[tokio::test]
async fn test_failed_fetch_still_delays_next_request() {
    let tmp = TempDir::new().unwrap();
    let stub = StubFetcher::new()
        .with_page("https://docs.test/", &page_html(&["/broken", "/fine"]))
        .with_failure("https://docs.test/broken")
        .with_page("https://docs.test/fine", &page_html(&[]));
    let log = stub.log_handle();

    let options = CrawlOptions {
        delay_ms: 100,
        ..stub_options(&tmp, "https://docs.test/")
    };
    let outcome = run_crawl(options, stub).await;
    assert_eq!(outcome.stats.errors, 1);

    let log = log.lock().unwrap();
    assert_eq!(
        log.fetched,
        vec![
            "https://docs.test/",
            "https://docs.test/broken",
            "https://docs.test/fine",
        ]
    );
    // The pause separates the failed attempt from the fetch after it
    let gap = log.fetched_at[2].duration_since(log.fetched_at[1]);
    assert!(gap >= Duration::from_millis(100), "gap was {:?}", gap);
}

#[tokio::test]
async fn test_unreachable_backend_fails_the_run() {
    let tmp = TempDir::new().unwrap();
    let stub = StubFetcher::new().unavailable();
    let log = stub.log_handle();

    let config = validate_options(stub_options(&tmp, "https://docs.test/")).unwrap();
    let crawler = Crawler::new(config, Box::new(stub));
    let err = crawler.run().await.unwrap_err();

    assert!(matches!(err, DocrawlError::Dependency(_)));
    assert!(!tmp.path().join("docs-out").exists());
    // Backend still closed on the failure path
    assert_eq!(log.lock().unwrap().close_calls, 1);
}

#[tokio::test]
async fn test_slow_fetch_times_out_and_continues() {
    let tmp = TempDir::new().unwrap();
    let stub = StubFetcher::new()
        .with_page("https://docs.test/", &page_html(&["/slow", "/fast"]))
        .with_page("https://docs.test/slow", &page_html(&[]))
        .with_delay("https://docs.test/slow", Duration::from_secs(5))
        .with_page("https://docs.test/fast", &page_html(&[]));

    let options = CrawlOptions {
        timeout_ms: 100,
        ..stub_options(&tmp, "https://docs.test/")
    };
    let outcome = run_crawl(options, stub).await;

    assert_eq!(outcome.stats.pages, 2);
    assert_eq!(outcome.stats.errors, 1);
    let index = read_index(&outcome.output_dir);
    let urls: Vec<&str> = index["pages"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["url"].as_str())
        .collect();
    assert!(!urls.contains(&"https://docs.test/slow"));
}

#[tokio::test]
async fn test_spec_resource_saved_without_recursion() {
    let tmp = TempDir::new().unwrap();
    let spec_body = r#"{"openapi":"3.0.0","paths":{}}"#;
    let stub = StubFetcher::new()
        .with_page("https://docs.test/", &page_html(&["/openapi.json"]))
        .with_resource("https://docs.test/openapi.json", spec_body, "application/json");

    let outcome = run_crawl(stub_options(&tmp, "https://docs.test/"), stub).await;

    assert_eq!(outcome.stats.pages, 1);
    assert_eq!(outcome.stats.specs, 1);

    let saved = std::fs::read_to_string(outcome.output_dir.join("specs/openapi.json")).unwrap();
    assert_eq!(saved, spec_body);

    let index = read_index(&outcome.output_dir);
    assert_eq!(index["specs"][0]["url"], "https://docs.test/openapi.json");
    assert_eq!(index["specs"][0]["type"], "openapi");
    assert_eq!(index["specs"][0]["path"], "specs/openapi.json");
    assert_eq!(index["totalPages"], 1);
}

#[tokio::test]
async fn test_output_bundle_layout() {
    let tmp = TempDir::new().unwrap();
    let stub = StubFetcher::new()
        .with_page("https://docs.test/", &page_html(&["/guide"]))
        .with_page("https://docs.test/guide", &page_html(&[]));

    let options = CrawlOptions {
        emit_chunks: true,
        ..stub_options(&tmp, "https://docs.test/")
    };
    let outcome = run_crawl(options, stub).await;

    let out = &outcome.output_dir;
    assert!(out.join("index.json").is_file());
    assert!(out.join("full.md").is_file());
    assert!(out.join("pages").is_dir());
    assert!(out.join("chunks/chunk-001.md").is_file());

    // No staging or backup directories survive a successful run
    let siblings: Vec<String> = std::fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(siblings, vec!["docs-out".to_string()]);

    let merged = std::fs::read_to_string(out.join("full.md")).unwrap();
    assert!(merged.contains("> Source: https://docs.test/"));
    assert!(merged.contains("> Source: https://docs.test/guide"));
}

#[tokio::test]
async fn test_interrupted_run_publishes_nothing() {
    let tmp = TempDir::new().unwrap();
    let stub = StubFetcher::new().with_page("https://docs.test/", &page_html(&[]));

    let config = validate_options(stub_options(&tmp, "https://docs.test/")).unwrap();
    let crawler = Crawler::new(config, Box::new(stub));
    crawler
        .cancel_flag()
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let outcome = crawler.run().await.unwrap();

    assert!(outcome.interrupted);
    assert!(!outcome.output_dir.exists());
}

#[tokio::test]
async fn test_diff_rerun_carries_unchanged_and_rewrites_changed() {
    let tmp = TempDir::new().unwrap();
    let stable_html = page_html(&["/changing"]);

    let first = StubFetcher::new()
        .with_page("https://docs.test/", &stable_html)
        .with_page(
            "https://docs.test/changing",
            "<html><body><main><h1>V1</h1><p>old</p></main></body></html>",
        );
    let outcome = run_crawl(stub_options(&tmp, "https://docs.test/"), first).await;
    assert_eq!(outcome.stats.pages, 2);

    let prior = read_index(&outcome.output_dir);
    let prior_pages = prior["pages"].as_array().unwrap();
    let record_for = |pages: &[Value], url: &str| -> Value {
        pages
            .iter()
            .find(|p| p["url"] == url)
            .cloned()
            .expect("record should exist")
    };
    let prior_root = record_for(prior_pages, "https://docs.test/");
    let prior_changing = record_for(prior_pages, "https://docs.test/changing");

    let second = StubFetcher::new()
        .with_page("https://docs.test/", &stable_html)
        .with_page(
            "https://docs.test/changing",
            "<html><body><main><h1>V2</h1><p>new</p></main></body></html>",
        );
    let options = CrawlOptions {
        diff_mode: true,
        ..stub_options(&tmp, "https://docs.test/")
    };
    let outcome = run_crawl(options, second).await;

    // Only the changed page counts as crawled; the other was skipped
    assert_eq!(outcome.stats.pages, 1);
    assert_eq!(outcome.stats.skipped_unchanged, 1);

    let index = read_index(&outcome.output_dir);
    assert_eq!(index["totalPages"], 2);
    let pages = index["pages"].as_array().unwrap();

    // Unchanged page carried over verbatim, original timestamp intact
    let root = record_for(pages, "https://docs.test/");
    assert_eq!(root["crawledAt"], prior_root["crawledAt"]);
    assert_eq!(root["contentHash"], prior_root["contentHash"]);

    // Changed page keeps its path but gets a new hash
    let changing = record_for(pages, "https://docs.test/changing");
    assert_eq!(changing["path"], prior_changing["path"]);
    assert_ne!(changing["contentHash"], prior_changing["contentHash"]);

    let body_path = outcome
        .output_dir
        .join(changing["path"].as_str().unwrap());
    let body = std::fs::read_to_string(body_path).unwrap();
    assert!(body.contains("V2"));
}

#[tokio::test]
async fn test_diff_children_of_unchanged_page_still_crawled() {
    let tmp = TempDir::new().unwrap();
    let root_html = page_html(&["/child"]);

    let first = StubFetcher::new()
        .with_page("https://docs.test/", &root_html)
        .with_page(
            "https://docs.test/child",
            "<html><body><main><h1>Child</h1><p>one</p></main></body></html>",
        );
    run_crawl(stub_options(&tmp, "https://docs.test/"), first).await;

    // Root unchanged, child changed: the child must still be reached
    let second = StubFetcher::new()
        .with_page("https://docs.test/", &root_html)
        .with_page(
            "https://docs.test/child",
            "<html><body><main><h1>Child</h1><p>two</p></main></body></html>",
        );
    let log = second.log_handle();
    let options = CrawlOptions {
        diff_mode: true,
        ..stub_options(&tmp, "https://docs.test/")
    };
    let outcome = run_crawl(options, second).await;

    assert!(log
        .lock()
        .unwrap()
        .fetched
        .contains(&"https://docs.test/child".to_string()));
    assert_eq!(outcome.stats.pages, 1);
    assert_eq!(outcome.stats.skipped_unchanged, 1);

    let index = read_index(&outcome.output_dir);
    assert_eq!(index["totalPages"], 2);
}

#[tokio::test]
async fn test_index_config_echo_and_links() {
    let tmp = TempDir::new().unwrap();
    let stub = StubFetcher::new()
        .with_page("https://docs.test/", &page_html(&["/guide"]))
        .with_page("https://docs.test/guide", &page_html(&[]));

    let options = CrawlOptions {
        max_depth: 3,
        exclude: vec![r"\.pdf$".to_string()],
        ..stub_options(&tmp, "https://docs.test/")
    };
    let outcome = run_crawl(options, stub).await;

    let index = read_index(&outcome.output_dir);
    assert_eq!(index["baseUrl"], "https://docs.test/");
    assert_eq!(index["config"]["maxDepth"], 3);
    assert_eq!(index["config"]["sameDomainOnly"], true);
    assert_eq!(index["config"]["exclude"][0], r"\.pdf$");

    let root = index["pages"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["url"] == "https://docs.test/")
        .unwrap();
    assert_eq!(root["links"][0], "https://docs.test/guide");
}
