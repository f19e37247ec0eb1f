//! WebDriver fetch backend
//!
//! Drives a browser session over the WebDriver protocol so pages arrive
//! fully rendered. The session is connected lazily on the first fetch and
//! torn down exactly once by `close()`; with session retention enabled the
//! handle is dropped without quitting the browser.

use crate::fetch::{FetchBackend, FetchedPage};
use crate::{DocrawlError, Result};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fetch backend backed by a WebDriver session
pub struct WebDriverFetcher {
    endpoint: String,
    user_agent: String,
    render_wait: Duration,
    headed: bool,
    keep_session: bool,
    client: Option<Client>,
}

impl WebDriverFetcher {
    /// Creates an unconnected backend; the session opens on first fetch
    pub fn new(
        endpoint: &str,
        user_agent: &str,
        render_wait: Duration,
        headed: bool,
        keep_session: bool,
    ) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            user_agent: user_agent.to_string(),
            render_wait,
            headed,
            keep_session,
            client: None,
        }
    }

    /// Connects on first use; a failure here is a missing-dependency error
    async fn ensure_connected(&mut self) -> Result<&Client> {
        if self.client.is_none() {
            info!("Connecting to WebDriver at {}", self.endpoint);

            let mut builder = ClientBuilder::rustls().map_err(|e| {
                DocrawlError::Dependency(format!("failed to initialize WebDriver client: {}", e))
            })?;
            builder.capabilities(chrome_capabilities(self.headed, &self.user_agent));

            let client = builder.connect(&self.endpoint).await.map_err(|e| {
                DocrawlError::Dependency(format!(
                    "cannot reach WebDriver at {}: {} (is chromedriver or geckodriver running?)",
                    self.endpoint, e
                ))
            })?;

            self.client = Some(client);
        }

        match &self.client {
            Some(client) => Ok(client),
            None => Err(DocrawlError::Dependency(
                "WebDriver session unavailable".to_string(),
            )),
        }
    }
}

#[async_trait]
impl FetchBackend for WebDriverFetcher {
    async fn fetch(&mut self, url: &str) -> Result<Option<FetchedPage>> {
        let render_wait = self.render_wait;
        let client = self.ensure_connected().await?;

        client.goto(url).await.map_err(|e| DocrawlError::Fetch {
            url: url.to_string(),
            message: format!("navigation failed: {}", e),
        })?;

        // Let client-side rendering settle before reading the document
        if !render_wait.is_zero() {
            tokio::time::sleep(render_wait).await;
        }

        let final_url = client
            .current_url()
            .await
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string());

        // Browsers expose the negotiated media type on the document itself
        let content_type = match client.execute("return document.contentType;", vec![]).await {
            Ok(value) => value.as_str().unwrap_or("text/html").to_string(),
            Err(e) => {
                debug!("contentType probe failed for {}: {}", url, e);
                "text/html".to_string()
            }
        };

        let html = client.source().await.map_err(|e| DocrawlError::Fetch {
            url: url.to_string(),
            message: format!("could not read page source: {}", e),
        })?;

        Ok(Some(FetchedPage {
            html,
            final_url,
            content_type,
        }))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            if self.keep_session {
                info!("Leaving WebDriver session open (session retention enabled)");
                return Ok(());
            }
            if let Err(e) = client.close().await {
                // Session teardown failures must not propagate past close
                warn!("WebDriver session close failed: {}", e);
            }
        }
        Ok(())
    }
}

/// Browser capabilities for the session
fn chrome_capabilities(headed: bool, user_agent: &str) -> serde_json::Map<String, serde_json::Value> {
    let mut args = Vec::new();
    if !headed {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    args.push(format!("--user-agent={}", user_agent));

    let mut caps = serde_json::Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        serde_json::json!({ "args": args }),
    );
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_backend_is_unconnected() {
        let backend = WebDriverFetcher::new(
            "http://localhost:9515",
            "docrawl/test",
            Duration::from_millis(0),
            false,
            false,
        );
        assert!(backend.client.is_none());
    }

    #[tokio::test]
    async fn test_close_without_session_is_ok() {
        let mut backend = WebDriverFetcher::new(
            "http://localhost:9515",
            "docrawl/test",
            Duration::from_millis(0),
            false,
            false,
        );
        assert!(backend.close().await.is_ok());
        assert!(backend.close().await.is_ok());
    }

    #[test]
    fn test_headless_capabilities() {
        let caps = chrome_capabilities(false, "docrawl/test");
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a.as_str() == Some("--headless=new")));
        assert!(args
            .iter()
            .any(|a| a.as_str() == Some("--user-agent=docrawl/test")));
    }

    #[test]
    fn test_headed_capabilities_omit_headless() {
        let caps = chrome_capabilities(true, "docrawl/test");
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a.as_str() == Some("--headless=new")));
    }
}
