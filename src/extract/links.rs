//! Outbound-link extraction and filtering
//!
//! Pulls anchors out of a fetched page and reduces them to the candidates
//! the traversal should enqueue: absolute http(s) URLs, normalized, scoped
//! by the crawl configuration, not yet visited, deduplicated in document
//! order.

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use crate::config::CrawlConfig;

/// Extracts the outbound links the traversal should follow from a page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only links (same-page anchors)
/// - Non-HTTP(S) URLs after resolution
/// - URLs outside the start host when `same_domain_only` is set
/// - URLs failing the include/exclude patterns
/// - URLs already in `visited`
///
/// **Note:** `rel="nofollow"` links ARE followed.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The page's own URL, for resolving relative links
/// * `visited` - Normalized URLs already dequeued this run
/// * `config` - Scope filters (same-domain, include/exclude patterns)
///
/// # Returns
///
/// Normalized absolute URLs in first-appearance document order, each at
/// most once.
pub fn extract_links(
    html: &str,
    base_url: &Url,
    visited: &HashSet<String>,
    config: &CrawlConfig,
) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut links = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(anchor_selector) = Selector::parse("a[href]") {
        for element in document.select(&anchor_selector) {
            // Anchors with a download attribute point at artifacts, not pages
            if element.value().attr("download").is_some() {
                continue;
            }

            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(url) = resolve_link(href, base_url) else {
                continue;
            };

            let normalized = normalize_url(&url);

            if !in_scope(&url, &normalized, config) {
                continue;
            }
            if visited.contains(&normalized) {
                continue;
            }
            if seen.insert(normalized.clone()) {
                links.push(normalized);
            }
        }
    }

    links
}

/// Normalizes a URL for visited-set and index keys
///
/// Only the fragment is dropped: `/guide#install` and `/guide` are the same
/// page. Query strings, trailing slashes, and case are preserved as-is.
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized.to_string()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    // Skip empty hrefs
    if href.is_empty() {
        return None;
    }

    // Skip special schemes
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Skip fragment-only links (same page anchors)
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            // Only accept HTTP and HTTPS URLs
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url)
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Applies the same-domain and include/exclude filters
fn in_scope(url: &Url, normalized: &str, config: &CrawlConfig) -> bool {
    if config.same_domain_only {
        let host = url.host_str().unwrap_or_default().to_lowercase();
        if host != config.start_host() {
            return false;
        }
    }

    if !config.include.is_empty() && !config.include.iter().any(|re| re.is_match(normalized)) {
        return false;
    }

    if config.exclude.iter().any(|re| re.is_match(normalized)) {
        return false;
    }

    true
}
