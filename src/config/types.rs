use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Which fetch backend drives the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Rendered fetches through a WebDriver session (default)
    WebDriver,

    /// Plain HTTP fetches, no rendering
    Http,
}

/// Immutable per-run crawl configuration
///
/// Built once by [`crate::config::validate_options`] from raw CLI options and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Crawl entry point; also anchors the same-domain filter
    pub start_url: Url,

    /// Maximum link depth from the start URL (0 = start page only)
    pub max_depth: u32,

    /// Maximum number of pages persisted per run (None = unlimited)
    pub max_pages: Option<usize>,

    /// Final output directory
    pub output_dir: PathBuf,

    /// Restrict traversal to the start URL's host
    pub same_domain_only: bool,

    /// URLs must match at least one of these to be followed (empty = all)
    pub include: Vec<Regex>,

    /// URLs matching any of these are never followed
    pub exclude: Vec<Regex>,

    /// Pause between consecutive fetches
    pub delay: Duration,

    /// Per-fetch timeout
    pub fetch_timeout: Duration,

    /// Settle time after navigation before the page is read
    pub render_wait: Duration,

    /// Re-crawl incrementally against the previous run's index
    pub diff_mode: bool,

    /// Write individual pages/page-NNN.md files
    pub emit_pages: bool,

    /// Write the merged full.md document
    pub emit_merged: bool,

    /// Write chunks/chunk-NNN.md files
    pub emit_chunks: bool,

    /// Honor robots.txt disallow rules
    pub respect_robots: bool,

    /// Which backend performs fetches
    pub backend: BackendKind,

    /// WebDriver endpoint for the rendered backend
    pub webdriver_url: String,

    /// Run the browser with a visible window
    pub headed: bool,

    /// Leave the WebDriver session open when the crawl ends
    pub keep_session: bool,

    /// User-agent string sent with fetches and matched against robots groups
    pub user_agent: String,
}

/// Raw, unvalidated crawl options as collected from the CLI
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub url: String,
    pub max_depth: u32,
    pub max_pages: Option<usize>,
    pub output_dir: PathBuf,
    pub same_domain_only: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub delay_ms: u64,
    pub timeout_ms: u64,
    pub wait_ms: u64,
    pub diff_mode: bool,
    pub emit_pages: bool,
    pub emit_merged: bool,
    pub emit_chunks: bool,
    pub respect_robots: bool,
    pub backend: BackendKind,
    pub webdriver_url: String,
    pub headed: bool,
    pub keep_session: bool,
    pub user_agent: Option<String>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_depth: 5,
            max_pages: None,
            output_dir: PathBuf::from("docs-out"),
            same_domain_only: true,
            include: Vec::new(),
            exclude: Vec::new(),
            delay_ms: 250,
            timeout_ms: 30_000,
            wait_ms: 1_000,
            diff_mode: false,
            emit_pages: true,
            emit_merged: true,
            emit_chunks: false,
            respect_robots: true,
            backend: BackendKind::WebDriver,
            webdriver_url: "http://localhost:9515".to_string(),
            headed: false,
            keep_session: false,
            user_agent: None,
        }
    }
}

impl CrawlConfig {
    /// Default user-agent string when none is configured
    pub fn default_user_agent() -> String {
        format!("docrawl/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Host of the start URL, lowercased. Anchors the same-domain filter.
    pub fn start_host(&self) -> String {
        self.start_url
            .host_str()
            .unwrap_or_default()
            .to_lowercase()
    }
}
