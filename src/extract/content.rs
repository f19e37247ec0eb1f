//! Main-content and metadata extraction
//!
//! Documentation pages wrap the actual content in a lot of chrome:
//! navigation trees, sidebars, cookie banners, footers. Converting the whole
//! page would drown the docs in menu text, so extraction selects the main
//! content region first and strips known noise elements from it.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Candidate selectors for the main content region, tried in order.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role='main']",
    "#content",
    ".content",
    "body",
];

/// Elements stripped from the content region before conversion.
const NOISE_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "nav",
    "header",
    "footer",
    "aside",
    "[role='navigation']",
    "[role='banner']",
    "[role='contentinfo']",
    "[aria-hidden='true']",
    ".sidebar",
    "#sidebar",
    ".cookie",
    ".consent",
    "#cookie",
    "#consent",
];

/// Page metadata pulled from `<title>` and `<meta>` tags
///
/// All fields are optional; pages without metadata serialize as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
}

/// Extracted information from a single HTML page
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// Page title (from the `<title>` tag)
    pub title: Option<String>,

    /// HTML of the main content region, noise elements removed
    pub content_html: String,

    /// Metadata from `<title>` and `<meta>` tags
    pub metadata: PageMetadata,
}

/// Extracts title, metadata, and the main content region from a page
///
/// The content region is the first match of [`CONTENT_SELECTORS`], falling
/// back to the whole document. `base_url` resolves relative `og:image`
/// references to absolute URLs.
///
/// # Arguments
///
/// * `html` - The rendered HTML of the page
/// * `base_url` - The page's own URL
pub fn extract_content(html: &str, base_url: &Url) -> ExtractedContent {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let metadata = extract_metadata(&document, base_url, title.clone());
    let content_html = extract_main_html(&document);

    ExtractedContent {
        title,
        content_html,
        metadata,
    }
}

/// Extracts the page title from the `<title>` tag
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collects `<meta>` tag values into a [`PageMetadata`] record
fn extract_metadata(document: &Html, base_url: &Url, title: Option<String>) -> PageMetadata {
    PageMetadata {
        title,
        description: meta_content(document, "meta[name='description']"),
        keywords: meta_content(document, "meta[name='keywords']"),
        author: meta_content(document, "meta[name='author']"),
        og_title: meta_content(document, "meta[property='og:title']"),
        og_description: meta_content(document, "meta[property='og:description']"),
        og_image: meta_content(document, "meta[property='og:image']")
            .map(|image| absolutize(&image, base_url)),
    }
}

/// Reads the `content` attribute of the first element matching `selector_str`
fn meta_content(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolves a possibly-relative reference against the page URL
fn absolutize(reference: &str, base_url: &Url) -> String {
    match base_url.join(reference) {
        Ok(url) => url.to_string(),
        Err(_) => reference.to_string(),
    }
}

/// Serializes the main content region with noise elements removed
fn extract_main_html(document: &Html) -> String {
    for selector_str in CONTENT_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                return remove_noise(&element.html());
            }
        }
    }

    remove_noise(&document.root_element().html())
}

/// Strips noise elements from a serialized content region
///
/// `scraper` documents are read-only, so removal works on the serialized
/// text: the region is re-parsed, and each noise element's outer HTML is
/// deleted from the string. Both the region and the noise elements come
/// from the same serializer, so the outer HTML is an exact substring.
fn remove_noise(region_html: &str) -> String {
    let document = Html::parse_document(region_html);
    let mut result = region_html.to_string();

    for selector_str in NOISE_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            for element in document.select(&selector) {
                let outer_html = element.html();
                result = result.replace(&outer_html, "");
            }
        }
    }

    result
}
