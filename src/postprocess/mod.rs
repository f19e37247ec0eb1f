//! Post-crawl document assembly: the merged full.md and heading chunks

pub mod chunk;
pub mod merge;

pub use chunk::chunk_document;
pub use merge::build_merged;
