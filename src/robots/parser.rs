//! Robots.txt parser implementation
//!
//! Line-parses robots.txt text into per-user-agent rule groups. The parser
//! is deliberately forgiving: unknown directives, lines without a colon, and
//! rules appearing before any `User-agent:` line are silently skipped, so a
//! half-broken robots.txt never aborts a crawl.

use std::collections::HashMap;

/// Allow/disallow pattern lists for one user-agent group
#[derive(Debug, Clone, Default)]
pub struct RuleGroup {
    /// Path patterns the agent must not fetch, in file order
    pub disallow: Vec<String>,

    /// Path patterns explicitly permitted, in file order
    pub allow: Vec<String>,
}

impl RuleGroup {
    /// Returns true if the group carries no patterns at all
    pub fn is_empty(&self) -> bool {
        self.disallow.is_empty() && self.allow.is_empty()
    }
}

/// Parses robots.txt text into rule groups keyed by lowercased user-agent
///
/// A `user-agent:` line opens a group (or re-opens an existing one, so a
/// later section for the same agent appends to it); `disallow:`/`allow:`
/// lines append to the most recently opened group.
///
/// # Arguments
///
/// * `text` - Plain robots.txt content (already unwrapped from any HTML)
///
/// # Returns
///
/// A map from lowercased user-agent to its [`RuleGroup`]
pub fn parse_groups(text: &str) -> HashMap<String, RuleGroup> {
    let mut groups: HashMap<String, RuleGroup> = HashMap::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();

        // Skip blanks and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Lines without a colon are malformed and skipped
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                let agent = value.to_lowercase();
                groups.entry(agent.clone()).or_default();
                current = Some(agent);
            }
            "disallow" => {
                // A disallow before any user-agent line has no group to join
                if let Some(agent) = &current {
                    if let Some(group) = groups.get_mut(agent) {
                        group.disallow.push(value.to_string());
                    }
                }
            }
            "allow" => {
                if let Some(agent) = &current {
                    if let Some(group) = groups.get_mut(agent) {
                        group.allow.push(value.to_string());
                    }
                }
            }
            // Crawl-delay, Sitemap and anything else are not rule patterns
            _ => {}
        }
    }

    groups
}
