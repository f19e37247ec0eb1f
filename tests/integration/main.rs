//! End-to-end crawl tests
//!
//! These tests drive the full crawl cycle against the deterministic stub
//! backend and assert on the committed output directory.

mod crawl_tests;
