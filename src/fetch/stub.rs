//! Deterministic in-memory fetch backend
//!
//! Tests drive the traversal against a canned set of pages instead of a
//! live browser. The stub records every fetch and close call in a shared
//! log so tests can assert on ordering and lifecycle after the crawl
//! consumed the backend.

use crate::fetch::{FetchBackend, FetchedPage};
use crate::{DocrawlError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Observable stub activity, shared with the test via [`StubFetcher::log_handle`]
#[derive(Debug, Default)]
pub struct StubLog {
    /// URLs in the order they were fetched
    pub fetched: Vec<String>,

    /// Fetch start times, index-aligned with `fetched`
    pub fetched_at: Vec<Instant>,

    /// Number of close() calls observed
    pub close_calls: usize,
}

/// Canned response for one URL
#[derive(Debug, Clone)]
struct StubEntry {
    html: String,
    content_type: String,
    final_url: Option<String>,
}

/// In-memory [`FetchBackend`] with canned responses
#[derive(Debug, Default)]
pub struct StubFetcher {
    entries: HashMap<String, StubEntry>,
    failures: HashSet<String>,
    delays: HashMap<String, Duration>,
    unavailable: bool,
    log: Arc<Mutex<StubLog>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `html` as a text/html page at `url`
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.entries.insert(
            url.to_string(),
            StubEntry {
                html: html.to_string(),
                content_type: "text/html".to_string(),
                final_url: None,
            },
        );
        self
    }

    /// Serves a non-page resource (spec files, robots.txt) at `url`
    pub fn with_resource(mut self, url: &str, body: &str, content_type: &str) -> Self {
        self.entries.insert(
            url.to_string(),
            StubEntry {
                html: body.to_string(),
                content_type: content_type.to_string(),
                final_url: None,
            },
        );
        self
    }

    /// Serves `html` at `url` but reports `final_url` as the landing URL
    pub fn with_redirected_page(mut self, url: &str, final_url: &str, html: &str) -> Self {
        self.entries.insert(
            url.to_string(),
            StubEntry {
                html: html.to_string(),
                content_type: "text/html".to_string(),
                final_url: Some(final_url.to_string()),
            },
        );
        self
    }

    /// Makes fetches of `url` fail with a fetch error
    pub fn with_failure(mut self, url: &str) -> Self {
        self.failures.insert(url.to_string());
        self
    }

    /// Makes every fetch fail as backend-unavailable
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Delays fetches of `url`, for timeout-race tests
    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// Handle onto the activity log, usable after the crawl consumed the stub
    pub fn log_handle(&self) -> Arc<Mutex<StubLog>> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl FetchBackend for StubFetcher {
    async fn fetch(&mut self, url: &str) -> Result<Option<FetchedPage>> {
        if let Ok(mut log) = self.log.lock() {
            log.fetched.push(url.to_string());
            log.fetched_at.push(Instant::now());
        }

        if self.unavailable {
            return Err(DocrawlError::Dependency(
                "stub backend unavailable".to_string(),
            ));
        }

        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }

        if self.failures.contains(url) {
            return Err(DocrawlError::Fetch {
                url: url.to_string(),
                message: "stubbed failure".to_string(),
            });
        }

        Ok(self.entries.get(url).map(|entry| FetchedPage {
            html: entry.html.clone(),
            final_url: entry
                .final_url
                .clone()
                .unwrap_or_else(|| url.to_string()),
            content_type: entry.content_type.clone(),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        if let Ok(mut log) = self.log.lock() {
            log.close_calls += 1;
        }
        Ok(())
    }
}
