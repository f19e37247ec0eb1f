//! Crawl output: index data model, file layout, and atomic persistence

pub mod commit;
pub mod index;
pub mod layout;

pub use commit::{OutputCommitStore, RunId};
pub use index::{ConfigEcho, CrawlIndex, PageRecord, PriorIndex, SpecKind, SpecRecord};
