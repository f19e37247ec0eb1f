//! Per-origin robots.txt cache
//!
//! A crawl fetches robots.txt at most once per origin, through the same
//! backend that fetches pages. The resulting engine (permissive when the
//! fetch failed) is cached here for the rest of the run.

use crate::robots::RobotsRuleEngine;
use std::collections::HashMap;

/// Robots engines keyed by robots.txt URL, so scheme and port variants
/// of a host get separate entries
#[derive(Debug, Default)]
pub struct RobotsCache {
    engines: HashMap<String, RobotsRuleEngine>,
}

impl RobotsCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if an engine is already cached for `robots_url`
    pub fn contains(&self, robots_url: &str) -> bool {
        self.engines.contains_key(robots_url)
    }

    /// Looks up the cached engine for `robots_url`
    pub fn get(&self, robots_url: &str) -> Option<&RobotsRuleEngine> {
        self.engines.get(robots_url)
    }

    /// Stores the engine for `robots_url`, replacing any previous entry
    pub fn insert(&mut self, robots_url: String, engine: RobotsRuleEngine) {
        self.engines.insert(robots_url, engine);
    }

    /// Number of origins with a cached engine
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Returns true if nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
