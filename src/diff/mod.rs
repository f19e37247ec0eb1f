//! Content hashing and prior-run state for incremental crawls
//!
//! Diff mode compares each page's Markdown body against the hash recorded
//! in the previous run's index.json and skips persistence for unchanged
//! pages. The prior state loads once at run start and is read-only
//! afterwards.

use std::collections::HashMap;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::output::{layout, PageRecord, PriorIndex};

/// Hashes a page's Markdown body for change detection
///
/// Returns the full SHA-256 digest as 64 lowercase hex characters. The
/// width is part of the index format: hashes from older runs compare
/// byte-for-byte against fresh ones.
pub fn compute_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Prior-run page records keyed by URL
#[derive(Debug, Default)]
pub struct DiffStore {
    records: HashMap<String, PageRecord>,
}

impl DiffStore {
    /// An empty store; every page reads as changed
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads prior-run state from an index.json path
    ///
    /// A missing file means a first run and yields an empty store. A
    /// malformed file is logged and treated the same way; loading never
    /// fails the crawl.
    pub fn load(index_path: &Path) -> Self {
        let raw = match std::fs::read_to_string(index_path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!(
                    path = %index_path.display(),
                    "no prior index, treating all pages as new"
                );
                return Self::empty();
            }
        };

        match serde_json::from_str::<PriorIndex>(&raw) {
            Ok(prior) => {
                let records = prior
                    .pages
                    .into_iter()
                    .map(|record| (record.url.clone(), record))
                    .collect::<HashMap<_, _>>();
                debug!(pages = records.len(), "loaded prior index for diff run");
                Self { records }
            }
            Err(e) => {
                warn!(
                    path = %index_path.display(),
                    error = %e,
                    "prior index is malformed, treating all pages as new"
                );
                Self::empty()
            }
        }
    }

    /// True when the URL is new or its body hash differs from the prior run
    ///
    /// This is the only gate deciding whether a page is re-persisted.
    pub fn is_changed(&self, url: &str, new_hash: &str) -> bool {
        match self.records.get(url) {
            Some(record) => record.content_hash != new_hash,
            None => true,
        }
    }

    /// The prior run's record for a URL, if any
    pub fn prior_record(&self, url: &str) -> Option<&PageRecord> {
        self.records.get(url)
    }

    /// Highest page ordinal among prior records
    ///
    /// New pages in a diff run number from here so their files never
    /// collide with carried-over ones.
    pub fn max_page_ordinal(&self) -> usize {
        self.records
            .values()
            .filter_map(|record| layout::parse_page_ordinal(&record.path))
            .max()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
