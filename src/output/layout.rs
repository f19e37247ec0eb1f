//! Output directory layout and file naming
//!
//! One place for every filename rule: page files are
//! `pages/page-NNN[-slug].md` with a zero-padded width-3 ordinal, chunks are
//! `chunks/chunk-NNN.md`, spec resources keep a sanitized version of their
//! URL filename under `specs/`.

use url::Url;

/// Longest slug kept in a page filename.
const MAX_SLUG_LEN: usize = 40;

/// Relative path for a page file, e.g. `pages/page-007-getting-started.md`
pub fn page_relative_path(ordinal: usize, title: Option<&str>) -> String {
    let slug = title.map(slugify).unwrap_or_default();
    if slug.is_empty() {
        format!("pages/page-{:03}.md", ordinal)
    } else {
        format!("pages/page-{:03}-{}.md", ordinal, slug)
    }
}

/// Relative path for a chunk file, e.g. `chunks/chunk-002.md`
pub fn chunk_relative_path(ordinal: usize) -> String {
    format!("chunks/chunk-{:03}.md", ordinal)
}

/// Reads the ordinal back out of a `pages/page-NNN[-slug].md` path
///
/// Returns None for paths that do not follow the page naming scheme.
pub fn parse_page_ordinal(relative_path: &str) -> Option<usize> {
    let filename = relative_path.rsplit('/').next()?;
    let rest = filename.strip_prefix("page-")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Reads the ordinal back out of a `chunk-NNN.md` filename
pub fn parse_chunk_ordinal(filename: &str) -> Option<usize> {
    let rest = filename.strip_prefix("chunk-")?;
    let digits = rest.strip_suffix(".md")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Filename for a spec resource, from the last URL path segment
///
/// Falls back to the host, then to "spec", so the result is never empty.
pub fn spec_filename(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(sanitize_filename)
        .unwrap_or_default();

    if !segment.is_empty() {
        return segment;
    }

    let host = url
        .host_str()
        .map(sanitize_filename)
        .unwrap_or_default();

    if !host.is_empty() {
        host
    } else {
        "spec".to_string()
    }
}

/// Turns a title into a short lowercase filename slug
///
/// Alphanumeric runs survive, everything else collapses to a single
/// hyphen, and the result is capped at [`MAX_SLUG_LEN`] characters.
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

/// Keeps filename-safe characters, replaces the rest with hyphens
fn sanitize_filename(raw: &str) -> String {
    let sanitized: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();

    sanitized.trim_matches(|c| c == '-' || c == '.').to_string()
}
