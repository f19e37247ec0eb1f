//! Robots.txt handling module
//!
//! This module parses robots.txt content into per-agent rule groups and
//! answers allow/disallow decisions with longest-match-wins semantics.
//! Parsing never fails: anything ambiguous resolves to permissive behavior,
//! so a broken robots.txt can only ever allow more, not abort a crawl.

mod cache;
mod matcher;
mod parser;

pub use cache::RobotsCache;
pub use matcher::{pattern_matches, MAX_PATTERN_LEN, MAX_PATTERN_WILDCARDS};
pub use parser::{parse_groups, RuleGroup};

use crate::fetch::unwrap_rendered_text;
use std::collections::HashMap;
use url::Url;

/// Per-site robots.txt decision engine for one configured user-agent
#[derive(Debug, Clone)]
pub struct RobotsRuleEngine {
    /// Rule groups keyed by lowercased user-agent
    groups: HashMap<String, RuleGroup>,

    /// Lowercased agent this engine answers for
    user_agent: String,
}

impl RobotsRuleEngine {
    /// Parses robots.txt text for the given user-agent
    ///
    /// The text may arrive wrapped in HTML when robots.txt was fetched
    /// through a rendering backend; any markup is stripped before the line
    /// parse. This constructor never fails.
    ///
    /// # Arguments
    ///
    /// * `text` - Raw robots.txt body, possibly HTML-wrapped
    /// * `user_agent` - The agent to answer decisions for
    pub fn parse(text: &str, user_agent: &str) -> Self {
        let cleaned = unwrap_rendered_text(text);
        Self {
            groups: parser::parse_groups(&cleaned),
            user_agent: user_agent.to_lowercase(),
        }
    }

    /// Creates a permissive engine that allows every URL
    ///
    /// Used when robots.txt cannot be fetched at all.
    pub fn allow_all(user_agent: &str) -> Self {
        Self {
            groups: HashMap::new(),
            user_agent: user_agent.to_lowercase(),
        }
    }

    /// Checks whether a URL (or bare path) may be fetched
    ///
    /// Group selection: the group exactly matching the configured agent
    /// (case-insensitive), else the `*` group, else everything is allowed.
    /// Within the selected group the longest matching pattern decides; ties
    /// and the no-match case resolve to allowed.
    pub fn is_allowed(&self, url: &str) -> bool {
        let group = self
            .groups
            .get(&self.user_agent)
            .or_else(|| self.groups.get("*"));

        let Some(group) = group else {
            return true;
        };

        matcher::decide(group, &matcher::target_path(url))
    }
}

/// Builds the robots.txt URL for the host serving `page_url`
pub fn robots_txt_url(page_url: &Url) -> Option<String> {
    let host = page_url.host_str()?;
    let mut out = format!("{}://{}", page_url.scheme(), host);
    if let Some(port) = page_url.port() {
        out.push_str(&format!(":{}", port));
    }
    out.push_str("/robots.txt");
    Some(out)
}
