//! Fetch backends
//!
//! A crawl owns exactly one fetch backend for its lifetime: a WebDriver
//! session that renders pages (default), a plain HTTP client, or the
//! deterministic in-memory stub used by tests. The backend session model is
//! single-session, so the traversal issues fetches strictly sequentially.

mod http;
mod stub;
mod webdriver;

pub use http::HttpFetcher;
pub use stub::{StubFetcher, StubLog};
pub use webdriver::WebDriverFetcher;

use crate::Result;
use async_trait::async_trait;

/// One successfully fetched resource
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Raw body as returned by the backend (rendered HTML for pages)
    pub html: String,

    /// URL after any redirects
    pub final_url: String,

    /// Content type as reported by the backend, may be empty
    pub content_type: String,
}

impl FetchedPage {
    /// Whether the content type indicates an HTML page
    ///
    /// An empty content type is treated as hypertext: rendering backends
    /// always produce a document, and an HTTP response without the header
    /// is almost always a page.
    pub fn is_hypertext(&self) -> bool {
        self.content_type.is_empty()
            || self.content_type.contains("text/html")
            || self.content_type.contains("xhtml")
    }
}

/// A single-session fetch capability, exclusively owned by the traversal
#[async_trait]
pub trait FetchBackend: Send {
    /// Fetches one URL
    ///
    /// `Ok(None)` means the backend had no content for the URL; errors are
    /// per-URL failures the traversal logs and skips.
    async fn fetch(&mut self, url: &str) -> Result<Option<FetchedPage>>;

    /// Releases backend resources; safe to call multiple times
    async fn close(&mut self) -> Result<()>;
}

/// Recovers raw text from content a rendering backend wrapped in HTML
///
/// Browsers present plain-text resources (robots.txt, JSON or YAML spec
/// files) as a small HTML document with the body inside a `<pre>` block.
/// This extracts the `<pre>` content when present, turns `<br>` variants
/// into newlines, strips remaining tags, and decodes the five standard
/// entities. Text without markup passes through unchanged.
pub fn unwrap_rendered_text(text: &str) -> String {
    if !looks_like_html(text) {
        return text.to_string();
    }

    let body = match extract_pre_block(text) {
        Some(pre) => pre,
        None => text.to_string(),
    };

    decode_entities(&strip_tags(&body))
}

fn looks_like_html(text: &str) -> bool {
    const MARKERS: [&str; 7] = ["<html", "<!doctype", "<pre", "<br", "<body", "<p>", "<div"];
    MARKERS
        .iter()
        .any(|marker| find_ignore_ascii_case(text, marker, 0).is_some())
}

/// Byte-offset search for an ASCII needle, ignoring ASCII case
fn find_ignore_ascii_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || from + needle.len() > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
        .map(|pos| from + pos)
}

/// Content of the first `<pre>` block, if any
fn extract_pre_block(text: &str) -> Option<String> {
    let open = find_ignore_ascii_case(text, "<pre", 0)?;
    let content_start = text[open..].find('>').map(|i| open + i + 1)?;
    let close = find_ignore_ascii_case(text, "</pre", content_start)?;
    Some(text[content_start..close].to_string())
}

/// Removes tags, emitting a newline for each `<br>` variant
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => {
                let name = rest[open + 1..open + close].trim_start_matches('/').trim();
                if is_br_tag(name) {
                    out.push('\n');
                }
                rest = &rest[open + close + 1..];
            }
            None => {
                // Unterminated tag: keep the remainder verbatim
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

fn is_br_tag(name: &str) -> bool {
    name.len() >= 2
        && name[..2].eq_ignore_ascii_case("br")
        && name[2..].chars().all(|c| c == ' ' || c == '/')
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
