//! Crawl index data model
//!
//! `index.json` is the run manifest: when the crawl ran, how it was
//! configured, and one record per persisted page and detected spec
//! resource. All keys are camelCase. `totalPages` is derived from the
//! pages array on every serialization and always equals its length.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CrawlConfig;
use crate::extract::PageMetadata;

/// One persisted page in the crawl index
///
/// Immutable once created; diff mode carries records from run to run
/// unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    /// Canonical page URL, unique within a run
    pub url: String,

    /// Page title, if the page had one
    pub title: Option<String>,

    /// Output file path relative to the output directory
    pub path: String,

    /// Link depth from the start URL
    pub depth: u32,

    /// Outbound links in extraction order
    pub links: Vec<String>,

    /// Metadata from `<title>` and `<meta>` tags
    pub metadata: PageMetadata,

    /// Hash of the page's Markdown body, 64 lowercase hex characters
    pub content_hash: String,

    /// When the page was fetched
    pub crawled_at: DateTime<Utc>,
}

/// Recognized API-spec resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecKind {
    Openapi,
    JsonSchema,
    Graphql,
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            SpecKind::Openapi => "openapi",
            SpecKind::JsonSchema => "json-schema",
            SpecKind::Graphql => "graphql",
        };
        write!(f, "{}", tag)
    }
}

/// One detected API-spec resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecRecord {
    /// Source URL of the resource
    pub url: String,

    /// Detected spec type
    #[serde(rename = "type")]
    pub kind: SpecKind,

    /// Output file path relative to the output directory
    pub path: String,
}

/// Config subset echoed into index.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEcho {
    pub start_url: String,
    pub max_depth: u32,
    pub max_pages: Option<usize>,
    pub same_domain_only: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub diff_mode: bool,
}

impl ConfigEcho {
    fn from_config(config: &CrawlConfig) -> Self {
        Self {
            start_url: config.start_url.to_string(),
            max_depth: config.max_depth,
            max_pages: config.max_pages,
            same_domain_only: config.same_domain_only,
            include: config.include.iter().map(|re| re.as_str().to_string()).collect(),
            exclude: config.exclude.iter().map(|re| re.as_str().to_string()).collect(),
            diff_mode: config.diff_mode,
        }
    }
}

/// Run manifest, accumulated during traversal and written at the end
#[derive(Debug, Clone)]
pub struct CrawlIndex {
    pub crawled_at: DateTime<Utc>,
    pub base_url: String,
    pub config: ConfigEcho,
    pub pages: Vec<PageRecord>,
    pub specs: Vec<SpecRecord>,
}

/// Serialized shape of index.json
///
/// `totalPages` exists only here, computed from `pages` at write time.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexFile<'a> {
    crawled_at: &'a DateTime<Utc>,
    base_url: &'a str,
    config: &'a ConfigEcho,
    total_pages: usize,
    pages: &'a [PageRecord],
    specs: &'a [SpecRecord],
}

/// Fields read back from a stored index.json
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorIndex {
    #[serde(default)]
    pub pages: Vec<PageRecord>,
}

impl CrawlIndex {
    pub fn new(config: &CrawlConfig) -> Self {
        Self {
            crawled_at: Utc::now(),
            base_url: config.start_url.to_string(),
            config: ConfigEcho::from_config(config),
            pages: Vec::new(),
            specs: Vec::new(),
        }
    }

    pub fn push_page(&mut self, record: PageRecord) {
        self.pages.push(record);
    }

    pub fn push_spec(&mut self, record: SpecRecord) {
        self.specs.push(record);
    }

    /// Number of pages the serialized `totalPages` field will carry
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    /// Appends prior-run records whose URL is absent from this run
    ///
    /// Current-run records always win; a prior record never replaces one.
    /// Used by diff mode to carry visited-but-unchanged pages forward.
    pub fn merge_prior_pages<I>(&mut self, prior: I)
    where
        I: IntoIterator<Item = PageRecord>,
    {
        let current: HashSet<String> = self.pages.iter().map(|p| p.url.clone()).collect();

        for record in prior {
            if !current.contains(&record.url) {
                self.pages.push(record);
            }
        }
    }

    /// Serializes the index as pretty-printed JSON
    pub fn to_json(&self) -> crate::Result<String> {
        let file = IndexFile {
            crawled_at: &self.crawled_at,
            base_url: &self.base_url,
            config: &self.config,
            total_pages: self.pages.len(),
            pages: &self.pages,
            specs: &self.specs,
        };

        Ok(serde_json::to_string_pretty(&file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{validate_options, CrawlOptions};

    fn test_config() -> CrawlConfig {
        let options = CrawlOptions {
            url: "https://docs.example.com/".to_string(),
            include: vec!["/guide/".to_string()],
            ..CrawlOptions::default()
        };
        validate_options(options).unwrap()
    }

    fn page(url: &str, hash: &str) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            title: Some("Page".to_string()),
            path: "pages/page-001.md".to_string(),
            depth: 0,
            links: vec![],
            metadata: PageMetadata::default(),
            content_hash: hash.to_string(),
            crawled_at: Utc::now(),
        }
    }

    #[test]
    fn test_total_pages_tracks_pages_len() {
        let mut index = CrawlIndex::new(&test_config());
        assert_eq!(index.total_pages(), 0);

        index.push_page(page("https://docs.example.com/a", "aa"));
        index.push_page(page("https://docs.example.com/b", "bb"));
        assert_eq!(index.total_pages(), 2);
    }

    #[test]
    fn test_serialized_shape() {
        let mut index = CrawlIndex::new(&test_config());
        index.push_page(page("https://docs.example.com/a", "aa"));

        let json = index.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["totalPages"], 1);
        assert_eq!(value["baseUrl"], "https://docs.example.com/");
        assert_eq!(value["config"]["maxDepth"], 5);
        assert_eq!(value["config"]["sameDomainOnly"], true);
        assert_eq!(value["config"]["include"][0], "/guide/");
        assert_eq!(value["pages"][0]["url"], "https://docs.example.com/a");
        assert_eq!(value["pages"][0]["contentHash"], "aa");
        assert!(value["crawledAt"].is_string());
    }

    #[test]
    fn test_spec_kind_tags() {
        let record = SpecRecord {
            url: "https://api.example.com/openapi.json".to_string(),
            kind: SpecKind::JsonSchema,
            path: "specs/openapi.json".to_string(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "json-schema");

        assert_eq!(SpecKind::Openapi.to_string(), "openapi");
        assert_eq!(SpecKind::Graphql.to_string(), "graphql");
    }

    #[test]
    fn test_merge_prior_pages_current_wins() {
        let mut index = CrawlIndex::new(&test_config());
        index.push_page(page("https://docs.example.com/a", "new-hash"));

        let prior = vec![
            page("https://docs.example.com/a", "old-hash"),
            page("https://docs.example.com/b", "bb"),
        ];
        index.merge_prior_pages(prior);

        assert_eq!(index.total_pages(), 2);
        assert_eq!(index.pages[0].content_hash, "new-hash");
        assert_eq!(index.pages[1].url, "https://docs.example.com/b");
    }

    #[test]
    fn test_round_trip_through_prior_index() {
        let mut index = CrawlIndex::new(&test_config());
        index.push_page(page("https://docs.example.com/a", "aa"));

        let json = index.to_json().unwrap();
        let prior: PriorIndex = serde_json::from_str(&json).unwrap();

        assert_eq!(prior.pages.len(), 1);
        assert_eq!(prior.pages[0].url, "https://docs.example.com/a");
        assert_eq!(prior.pages[0].content_hash, "aa");
    }
}
