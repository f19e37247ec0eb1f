//! Robots.txt path matching
//!
//! Patterns are matched by explicit segment scanning rather than regex,
//! because robots.txt is untrusted input. `*` matches any run of characters
//! and a trailing `$` anchors the pattern at the end of the path.

use crate::robots::parser::RuleGroup;
use url::Url;

/// Patterns longer than this are treated as non-matching
pub const MAX_PATTERN_LEN: usize = 500;

/// Patterns with more wildcards than this are treated as non-matching
pub const MAX_PATTERN_WILDCARDS: usize = 10;

/// Extracts the path component a robots pattern is matched against
///
/// For a full URL this is `pathname + search`; a string that does not parse
/// as a URL (typically a bare path) is used as-is.
pub fn target_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let mut path = parsed.path().to_string();
            if let Some(query) = parsed.query() {
                path.push('?');
                path.push_str(query);
            }
            path
        }
        Err(_) => url.to_string(),
    }
}

/// Tests a single robots pattern against a path
///
/// Oversized patterns (over [`MAX_PATTERN_LEN`] characters or more than
/// [`MAX_PATTERN_WILDCARDS`] wildcards) are rejected outright. The empty
/// pattern never matches, which makes a bare `Disallow:` line a no-op.
pub fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern.is_empty() || pattern.len() > MAX_PATTERN_LEN {
        return false;
    }
    if pattern.matches('*').count() > MAX_PATTERN_WILDCARDS {
        return false;
    }

    let (body, anchored_end) = match pattern.strip_suffix('$') {
        Some(body) => (body, true),
        None => (pattern, false),
    };

    if !body.contains('*') {
        return if anchored_end {
            path == body
        } else {
            path.starts_with(body)
        };
    }

    wildcard_match(body, path, anchored_end)
}

/// Decides allow/disallow for a path against one rule group
///
/// Among all matching patterns from both lists, the longest pattern string
/// wins; an equal-length tie or no match at all resolves to allowed.
pub fn decide(group: &RuleGroup, path: &str) -> bool {
    let best_allow = longest_match(&group.allow, path);
    let best_disallow = longest_match(&group.disallow, path);

    match (best_allow, best_disallow) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(allow_len), Some(disallow_len)) => allow_len >= disallow_len,
    }
}

/// Length of the longest pattern in `patterns` matching `path`, if any
fn longest_match(patterns: &[String], path: &str) -> Option<usize> {
    patterns
        .iter()
        .filter(|p| pattern_matches(p, path))
        .map(|p| p.len())
        .max()
}

/// Segment-by-segment wildcard scan
///
/// The pattern body is split on `*`: the first segment anchors at the start
/// of the path, each interior segment must appear in order after the previous
/// match position, and the last segment either anchors at the end (pattern
/// ended in `$`) or merely has to appear somewhere after the previous one.
fn wildcard_match(body: &str, path: &str, anchored_end: bool) -> bool {
    let segments: Vec<&str> = body.split('*').collect();

    let first = segments[0];
    if !path.starts_with(first) {
        return false;
    }
    let mut pos = first.len();

    let last_index = segments.len() - 1;
    for (i, segment) in segments.iter().enumerate().skip(1) {
        if i == last_index {
            if anchored_end {
                return path.ends_with(segment) && path.len() - segment.len() >= pos;
            }
            if segment.is_empty() {
                return true;
            }
            return path[pos..].contains(segment);
        }

        match path[pos..].find(segment) {
            Some(found) => pos += found + segment.len(),
            None => return false,
        }
    }

    true
}
