//! docrawl: a documentation-site crawler
//!
//! This crate crawls a documentation website through a rendering backend,
//! converts each page to Markdown, and commits a structured output bundle
//! (per-page files, a merged document, optional chunks, and an index)
//! atomically.

pub mod config;
pub mod crawler;
pub mod diff;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod postprocess;
pub mod robots;

use thiserror::Error;

/// Main error type for docrawl operations
#[derive(Debug, Error)]
pub enum DocrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch backend unavailable: {0}")]
    Dependency(String),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Fetch timed out after {timeout_ms}ms for {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Markdown conversion error: {0}")]
    Convert(String),

    #[error("Index error: {0}")]
    Index(#[from] serde_json::Error),

    #[error("Output commit error: {message}: {source}")]
    Commit {
        message: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid start URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid filter pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for docrawl operations
pub type Result<T> = std::result::Result<T, DocrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use crawler::{crawl, Crawler, CrawlOutcome, CrawlStats};
pub use diff::{compute_hash, DiffStore};
pub use fetch::{FetchBackend, FetchedPage, HttpFetcher, StubFetcher, WebDriverFetcher};
pub use output::{CrawlIndex, OutputCommitStore, PageRecord, RunId, SpecRecord};
pub use robots::RobotsRuleEngine;
