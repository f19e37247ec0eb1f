use crate::config::types::{CrawlConfig, CrawlOptions};
use crate::ConfigError;
use regex::Regex;
use std::time::Duration;
use url::Url;

/// Hard ceiling on the configured crawl depth
pub const MAX_DEPTH_CEILING: u32 = 50;

/// Validates raw options and builds the immutable [`CrawlConfig`]
///
/// All configuration errors are reported here, before any fetch occurs.
pub fn validate_options(opts: CrawlOptions) -> Result<CrawlConfig, ConfigError> {
    let start_url = validate_start_url(&opts.url)?;

    if opts.max_depth > MAX_DEPTH_CEILING {
        return Err(ConfigError::Validation(format!(
            "max depth must be at most {}, got {}",
            MAX_DEPTH_CEILING, opts.max_depth
        )));
    }

    if let Some(max_pages) = opts.max_pages {
        if max_pages == 0 {
            return Err(ConfigError::Validation(
                "max pages must be at least 1 when set".to_string(),
            ));
        }
    }

    if opts.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "fetch timeout must be at least 1ms".to_string(),
        ));
    }

    if opts.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    let include = compile_patterns(&opts.include, "include")?;
    let exclude = compile_patterns(&opts.exclude, "exclude")?;

    Ok(CrawlConfig {
        start_url,
        max_depth: opts.max_depth,
        max_pages: opts.max_pages,
        output_dir: opts.output_dir,
        same_domain_only: opts.same_domain_only,
        include,
        exclude,
        delay: Duration::from_millis(opts.delay_ms),
        fetch_timeout: Duration::from_millis(opts.timeout_ms),
        render_wait: Duration::from_millis(opts.wait_ms),
        diff_mode: opts.diff_mode,
        emit_pages: opts.emit_pages,
        emit_merged: opts.emit_merged,
        emit_chunks: opts.emit_chunks,
        respect_robots: opts.respect_robots,
        backend: opts.backend,
        webdriver_url: opts.webdriver_url,
        headed: opts.headed,
        keep_session: opts.keep_session,
        user_agent: opts
            .user_agent
            .unwrap_or_else(CrawlConfig::default_user_agent),
    })
}

/// Validates the start URL: parseable, http or https scheme
fn validate_start_url(raw: &str) -> Result<Url, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::InvalidUrl(
            "start URL cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}': scheme must be http or https, got '{}'",
            raw,
            url.scheme()
        )));
    }

    Ok(url)
}

/// Compiles a list of filter patterns, naming the offending pattern on error
fn compile_patterns(patterns: &[String], which: &str) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| {
                ConfigError::InvalidPattern(format!("invalid {} pattern '{}': {}", which, p, e))
            })
        })
        .collect()
}
