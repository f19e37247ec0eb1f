//! Configuration module for docrawl
//!
//! Raw CLI options are validated here into the immutable [`CrawlConfig`]
//! that every other subsystem reads. All configuration errors surface
//! before any fetch occurs.

mod types;
mod validation;

// Re-export types
pub use types::{BackendKind, CrawlConfig, CrawlOptions};

// Re-export validation entry points
pub use validation::{validate_options, MAX_DEPTH_CEILING};
