//! Heading-based document chunking
//!
//! Splits the merged document into one chunk per top-level heading, for
//! consumers that want retrieval-sized pieces instead of one large file.

/// Splits a document at top-level (`# `) heading boundaries
///
/// Content before the first heading becomes its own chunk. Headings inside
/// fenced code blocks do not split. A document with no top-level headings
/// yields exactly one chunk holding the whole trimmed text; an empty
/// document yields none.
pub fn chunk_document(document: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut in_fence = false;

    for line in document.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }

        if !in_fence && line.starts_with("# ") && !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
            current.clear();
        }

        current.push_str(line);
        current.push('\n');
    }

    let last = current.trim();
    if !last.is_empty() {
        chunks.push(last.to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_headings_two_chunks() {
        let document = "# One\n\nFirst body.\n\n# Two\n\nSecond body.";
        let chunks = chunk_document(document);

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("# One"));
        assert!(chunks[0].contains("First body."));
        assert!(chunks[1].starts_with("# Two"));
        assert!(chunks[1].contains("Second body."));
    }

    #[test]
    fn test_no_heading_single_chunk() {
        let document = "Just prose.\n\nMore prose.";
        let chunks = chunk_document(document);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "Just prose.\n\nMore prose.");
    }

    #[test]
    fn test_prose_before_first_heading_is_own_chunk() {
        let document = "Preamble.\n\n# First\n\nBody.";
        let chunks = chunk_document(document);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "Preamble.");
        assert!(chunks[1].starts_with("# First"));
    }

    #[test]
    fn test_heading_inside_fence_does_not_split() {
        let document = "# Real\n\n```\n# not a heading\ncode\n```\n\nAfter.";
        let chunks = chunk_document(document);

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("# not a heading"));
        assert!(chunks[0].contains("After."));
    }

    #[test]
    fn test_heading_after_fence_splits_again() {
        let document = "# One\n\n```\ncode\n```\n\n# Two\n\nBody.";
        let chunks = chunk_document(document);

        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].starts_with("# Two"));
    }

    #[test]
    fn test_subheadings_do_not_split() {
        let document = "# One\n\n## Sub\n\ntext\n\n### Deeper\n\nmore";
        let chunks = chunk_document(document);

        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_empty_document_no_chunks() {
        assert!(chunk_document("").is_empty());
        assert!(chunk_document("   \n\n  ").is_empty());
    }
}
