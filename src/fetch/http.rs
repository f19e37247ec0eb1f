//! Plain HTTP fetch backend
//!
//! Fetches pages without rendering. Suitable for documentation sites that
//! serve complete HTML; sites that assemble content client-side need the
//! WebDriver backend instead.

use crate::fetch::{FetchBackend, FetchedPage};
use crate::{DocrawlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Fetch backend backed by a reqwest client
pub struct HttpFetcher {
    user_agent: String,
    timeout: Duration,
    client: Option<Client>,
}

impl HttpFetcher {
    /// Creates an unconnected backend; the client is built on first fetch
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            timeout,
            client: None,
        }
    }

    fn ensure_client(&mut self) -> Result<&Client> {
        if self.client.is_none() {
            debug!("Building HTTP client");
            let client = Client::builder()
                .user_agent(self.user_agent.clone())
                .timeout(self.timeout)
                .connect_timeout(Duration::from_secs(10))
                .gzip(true)
                .brotli(true)
                .build()
                .map_err(|e| {
                    DocrawlError::Dependency(format!("failed to build HTTP client: {}", e))
                })?;
            self.client = Some(client);
        }

        match &self.client {
            Some(client) => Ok(client),
            None => Err(DocrawlError::Dependency(
                "HTTP client unavailable".to_string(),
            )),
        }
    }
}

#[async_trait]
impl FetchBackend for HttpFetcher {
    async fn fetch(&mut self, url: &str) -> Result<Option<FetchedPage>> {
        let timeout_ms = self.timeout.as_millis() as u64;
        let client = self.ensure_client()?;

        let response = match client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return Err(classify_request_error(url, timeout_ms, e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DocrawlError::Fetch {
                url: url.to_string(),
                message: format!("HTTP status {}", status),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let html = response
            .text()
            .await
            .map_err(|e| DocrawlError::Fetch {
                url: url.to_string(),
                message: format!("could not read response body: {}", e),
            })?;

        Ok(Some(FetchedPage {
            html,
            final_url,
            content_type,
        }))
    }

    async fn close(&mut self) -> Result<()> {
        self.client = None;
        Ok(())
    }
}

/// Maps reqwest send errors onto the crate taxonomy
fn classify_request_error(url: &str, timeout_ms: u64, e: reqwest::Error) -> DocrawlError {
    if e.is_timeout() {
        DocrawlError::Timeout {
            url: url.to_string(),
            timeout_ms,
        }
    } else if e.is_connect() {
        DocrawlError::Fetch {
            url: url.to_string(),
            message: format!("connection failed: {}", e),
        }
    } else {
        DocrawlError::Http {
            url: url.to_string(),
            source: e,
        }
    }
}
