//! Content, metadata, and link extraction from fetched pages

pub mod content;
pub mod links;
pub mod markdown;

pub use content::{extract_content, ExtractedContent, PageMetadata};
pub use links::{extract_links, normalize_url};
pub use markdown::html_to_markdown;
