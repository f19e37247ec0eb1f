//! Merged-document generation
//!
//! `full.md` stitches every crawled page into one document: a generated
//! heading per page, a source-URL line, then the page body. Bodies lose
//! their leading frontmatter block and a duplicate leading H1 so headings
//! appear exactly once.

use std::collections::HashMap;

use tracing::debug;

use crate::output::PageRecord;

/// Separator between page sections in the merged document.
const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Builds the merged document from index pages and their bodies
///
/// Pages appear in index order. A page whose body is unavailable is
/// skipped with a log line rather than producing an empty section.
pub fn build_merged(pages: &[PageRecord], bodies: &HashMap<String, String>) -> String {
    let mut sections = Vec::new();

    for page in pages {
        let Some(body) = bodies.get(&page.url) else {
            debug!(url = %page.url, "no body available for merged document");
            continue;
        };
        sections.push(merge_section(page, body));
    }

    sections.join(SECTION_SEPARATOR)
}

/// Renders one page as a merged-document section
fn merge_section(page: &PageRecord, body: &str) -> String {
    let heading = page
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(&page.url);

    let body = strip_leading_frontmatter(body);
    let body = strip_duplicate_heading(&body, heading);

    format!("# {}\n\n> Source: {}\n\n{}", heading, page.url, body.trim())
}

/// Removes a leading `---` frontmatter block, if present
///
/// The opening fence must be the first line and a closing fence must
/// follow; otherwise the text is left alone (a lone `---` is a horizontal
/// rule, not frontmatter).
fn strip_leading_frontmatter(body: &str) -> String {
    let mut lines = body.lines();

    if lines.next().map(str::trim) != Some("---") {
        return body.to_string();
    }

    let mut remainder = Vec::new();
    let mut closed = false;

    for line in lines {
        if closed {
            remainder.push(line);
        } else if line.trim() == "---" {
            closed = true;
        }
    }

    if !closed {
        return body.to_string();
    }

    remainder.join("\n").trim_start().to_string()
}

/// Drops the body's first line when it repeats the generated heading
fn strip_duplicate_heading(body: &str, heading: &str) -> String {
    let trimmed = body.trim_start();

    if let Some(first_line) = trimmed.lines().next() {
        if let Some(h1) = first_line.strip_prefix("# ") {
            if h1.trim() == heading {
                return trimmed[first_line.len()..].trim_start().to_string();
            }
        }
    }

    body.to_string()
}
