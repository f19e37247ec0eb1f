//! Crawl orchestration
//!
//! This module contains the traversal that drives a whole crawl:
//! - Depth-first walk with a visited set and explicit stack
//! - Per-URL admission (depth, page limit, robots.txt)
//! - Spec resource detection for non-HTML fetches
//! - Run statistics and the final summary

mod specs;
mod stats;
mod traversal;

pub use specs::detect_spec_kind;
pub use stats::CrawlStats;
pub use traversal::{CrawlOutcome, CrawlState, Crawler};

use crate::config::CrawlConfig;
use crate::fetch::FetchBackend;
use crate::Result;

/// Runs a complete crawl operation
///
/// Convenience wrapper that builds a [`Crawler`], runs it to completion,
/// and returns the outcome. Callers that need cancellation construct the
/// crawler themselves and keep its [`Crawler::cancel_flag`] handle.
///
/// # Arguments
///
/// * `config` - Validated crawl configuration
/// * `backend` - The fetch backend the crawl will own
pub async fn crawl(config: CrawlConfig, backend: Box<dyn FetchBackend>) -> Result<CrawlOutcome> {
    Crawler::new(config, backend).run().await
}
