//! HTML to Markdown conversion

use crate::{DocrawlError, Result};

/// Converts a content-region HTML string to cleaned Markdown
///
/// # Arguments
///
/// * `html` - The content HTML (usually from
///   [`extract_content`](crate::extract::extract_content))
///
/// # Returns
///
/// * `Ok(String)` - Trimmed Markdown, no trailing newline
/// * `Err(DocrawlError::Convert)` - The converter rejected the input
pub fn html_to_markdown(html: &str) -> Result<String> {
    let converter = htmd::HtmlToMarkdown::builder().build();

    let markdown = converter
        .convert(html)
        .map_err(|e| DocrawlError::Convert(e.to_string()))?;

    Ok(clean_markdown(&markdown))
}

/// Tidies converter output
///
/// Collapses runs of blank lines down to two and drops empty-link
/// artifacts left over from stripped navigation. Keeps everything else
/// verbatim, including fences and horizontal rules.
fn clean_markdown(markdown: &str) -> String {
    let mut result = String::new();
    let mut consecutive_empty = 0;

    for line in markdown.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            consecutive_empty += 1;
            // Allow max 2 consecutive empty lines
            if consecutive_empty <= 2 {
                result.push('\n');
            }
            continue;
        }

        // Skip empty-link artifacts from stripped icons and anchors
        if trimmed == "[]" || trimmed == "[]()" || trimmed == "[ ]()" {
            continue;
        }

        consecutive_empty = 0;

        result.push_str(line.trim_end());
        result.push('\n');
    }

    result.trim().to_string()
}
