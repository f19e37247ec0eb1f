//! Depth-first crawl traversal
//!
//! The crawler owns one fetch backend and drives it over the site,
//! depth-first from the start URL, deciding for every candidate URL
//! whether it gets fetched at all. Per-URL failures never stop the run;
//! backend-unavailable and output-commit failures do.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CrawlConfig;
use crate::crawler::specs::detect_spec_kind;
use crate::crawler::stats::CrawlStats;
use crate::diff::{compute_hash, DiffStore};
use crate::extract::{extract_content, extract_links, html_to_markdown, normalize_url};
use crate::fetch::{unwrap_rendered_text, FetchBackend, FetchedPage};
use crate::output::{
    layout, CrawlIndex, OutputCommitStore, PageRecord, RunId, SpecRecord,
};
use crate::robots::{robots_txt_url, RobotsCache, RobotsRuleEngine};
use crate::Result;

/// Crawler lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Result of a finished crawl
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Run counters
    pub stats: CrawlStats,

    /// The output directory readers consume
    pub output_dir: std::path::PathBuf,

    /// True when the run stopped on a cancellation request; the output was
    /// left unfinalized
    pub interrupted: bool,
}

/// One pending traversal candidate
struct StackEntry {
    url: String,
    depth: u32,
}

/// Mutable per-run traversal state
struct RunState {
    visited: HashSet<String>,
    index: CrawlIndex,
    bodies: HashMap<String, String>,
    unchanged: Vec<String>,
    robots: RobotsCache,
    next_ordinal: usize,
    skipped_unchanged: usize,
    errors: usize,
    interrupted: bool,
}

impl RunState {
    fn new(index: CrawlIndex, next_ordinal: usize) -> Self {
        Self {
            visited: HashSet::new(),
            index,
            bodies: HashMap::new(),
            unchanged: Vec::new(),
            robots: RobotsCache::new(),
            next_ordinal,
            skipped_unchanged: 0,
            errors: 0,
            interrupted: false,
        }
    }
}

/// Depth-first documentation crawler
///
/// Owns the fetch backend for the whole run. `run` consumes the crawler,
/// so a crawl can only happen once per instance.
pub struct Crawler {
    config: CrawlConfig,
    backend: Box<dyn FetchBackend>,
    state: CrawlState,
    cancel: Arc<AtomicBool>,
}

impl Crawler {
    /// Creates a crawler in the Idle state
    ///
    /// The backend connects lazily on its first fetch, so construction
    /// never touches the network.
    pub fn new(config: CrawlConfig, backend: Box<dyn FetchBackend>) -> Self {
        Self {
            config,
            backend,
            state: CrawlState::Idle,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Handle for requesting a graceful stop
    ///
    /// When set, the traversal stops at its next loop checkpoint, closes
    /// the backend, and leaves the output directory unfinalized.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Runs the crawl to completion
    ///
    /// 1. Open the output store (staged, or in-place for diff mode)
    /// 2. Load prior-run state when diffing
    /// 3. Walk the site depth-first, persisting pages and spec resources
    /// 4. Merge carried-over records back into the index (diff mode)
    /// 5. Build the merged document and chunks
    /// 6. Write index.json and finalize the output directory
    ///
    /// The backend session closes exactly once, whether the run completes,
    /// fails, or is cancelled.
    pub async fn run(mut self) -> Result<CrawlOutcome> {
        self.state = CrawlState::Running;
        info!(start = %self.config.start_url, max_depth = self.config.max_depth, "starting crawl");

        let result = self.run_inner().await;

        if let Err(e) = self.backend.close().await {
            warn!(error = %e, "error closing fetch backend");
        }

        match result {
            Ok(outcome) => {
                self.state = CrawlState::Completed;
                debug!(state = ?self.state, "crawler finished");
                Ok(outcome)
            }
            Err(e) => {
                self.state = CrawlState::Failed;
                debug!(state = ?self.state, "crawler finished");
                Err(e)
            }
        }
    }

    async fn run_inner(&mut self) -> Result<CrawlOutcome> {
        let started = Instant::now();
        let run_id = RunId::new();

        let mut store = if self.config.diff_mode {
            OutputCommitStore::direct(&self.config.output_dir, self.config.emit_pages)?
        } else {
            OutputCommitStore::staged(&self.config.output_dir, &run_id, self.config.emit_pages)?
        };

        // Prior state loads after the store so a recovered backup is visible
        let prior = if self.config.diff_mode {
            DiffStore::load(&self.config.output_dir.join("index.json"))
        } else {
            DiffStore::empty()
        };

        let index = CrawlIndex::new(&self.config);
        let mut state = RunState::new(index, prior.max_page_ordinal() + 1);

        if let Err(e) = self.traverse(&mut store, &prior, &mut state).await {
            store.cleanup();
            return Err(e);
        }

        let pages_persisted = state.index.total_pages();
        let stats = CrawlStats {
            pages: pages_persisted,
            skipped_unchanged: state.skipped_unchanged,
            specs: state.index.specs.len(),
            errors: state.errors,
            duration: started.elapsed(),
        };

        if state.interrupted {
            info!("crawl interrupted, leaving output unfinalized");
            return Ok(CrawlOutcome {
                stats,
                output_dir: store.final_dir().to_path_buf(),
                interrupted: true,
            });
        }

        if self.config.diff_mode {
            let carried: Vec<PageRecord> = state
                .unchanged
                .iter()
                .filter_map(|url| prior.prior_record(url).cloned())
                .collect();
            state.index.merge_prior_pages(carried);
        }

        if let Err(e) = self.commit(&mut store, &state) {
            store.cleanup();
            return Err(e);
        }

        info!(
            pages = stats.pages,
            unchanged = stats.skipped_unchanged,
            specs = stats.specs,
            errors = stats.errors,
            duration_ms = stats.duration.as_millis() as u64,
            "crawl completed"
        );

        Ok(CrawlOutcome {
            stats,
            output_dir: store.final_dir().to_path_buf(),
            interrupted: false,
        })
    }

    /// The admission loop
    ///
    /// Candidates pop off an explicit stack; children push in reverse
    /// extraction order so the first link of a page is visited next.
    /// Each candidate passes, in order: visited check, depth check, page
    /// cutoff, visited marking, robots check, fetch.
    async fn traverse(
        &mut self,
        store: &mut OutputCommitStore,
        prior: &DiffStore,
        state: &mut RunState,
    ) -> Result<()> {
        let start_url = normalize_url(&self.config.start_url);
        let mut stack = vec![StackEntry {
            url: start_url,
            depth: 0,
        }];

        while let Some(entry) = stack.pop() {
            if self.cancel.load(Ordering::SeqCst) {
                info!("cancellation requested, stopping crawl");
                state.interrupted = true;
                break;
            }

            if state.visited.contains(&entry.url) {
                continue;
            }

            if entry.depth > self.config.max_depth {
                debug!(url = %entry.url, depth = entry.depth, "past max depth, skipping");
                continue;
            }

            if let Some(max_pages) = self.config.max_pages {
                if state.index.total_pages() >= max_pages {
                    info!(max_pages, "page limit reached, stopping traversal");
                    break;
                }
            }

            // Past this point the candidate counts as visited, whatever
            // happens to the fetch
            state.visited.insert(entry.url.clone());

            if self.config.respect_robots
                && !self.robots_allow(&entry.url, &mut state.robots).await
            {
                info!(url = %entry.url, "disallowed by robots.txt");
                continue;
            }

            debug!(url = %entry.url, depth = entry.depth, "fetching");
            let attempt = timeout(self.config.fetch_timeout, self.backend.fetch(&entry.url)).await;
            let fetched = match attempt {
                Ok(Ok(Some(page))) => Some(page),
                Ok(Ok(None)) => {
                    debug!(url = %entry.url, "backend returned no content, skipping");
                    None
                }
                Ok(Err(e @ crate::DocrawlError::Dependency(_))) => {
                    // An unreachable backend fails every URL, not just this one
                    return Err(e);
                }
                Ok(Err(e)) => {
                    warn!(url = %entry.url, error = %e, "fetch failed, skipping");
                    state.errors += 1;
                    None
                }
                Err(_) => {
                    warn!(
                        url = %entry.url,
                        timeout_ms = self.config.fetch_timeout.as_millis() as u64,
                        "fetch timed out, skipping"
                    );
                    state.errors += 1;
                    None
                }
            };

            if let Some(page) = fetched {
                if page.is_hypertext() {
                    self.process_page(&entry, &page, store, prior, state, &mut stack)?;
                } else {
                    self.process_resource(&entry, &page, store, state)?;
                }
            }

            // The pause follows every fetch attempt, failed ones included
            if !self.config.delay.is_zero() {
                sleep(self.config.delay).await;
            }
        }

        Ok(())
    }

    /// Handles a hypertext fetch: extract, convert, diff, persist, recurse
    fn process_page(
        &self,
        entry: &StackEntry,
        fetched: &FetchedPage,
        store: &mut OutputCommitStore,
        prior: &DiffStore,
        state: &mut RunState,
        stack: &mut Vec<StackEntry>,
    ) -> Result<()> {
        // Relative links resolve against where the fetch actually landed
        let base = Url::parse(&fetched.final_url)
            .or_else(|_| Url::parse(&entry.url));
        let Ok(base) = base else {
            warn!(url = %entry.url, "unparseable page URL, skipping");
            state.errors += 1;
            return Ok(());
        };

        let extracted = extract_content(&fetched.html, &base);
        let links = extract_links(&fetched.html, &base, &state.visited, &self.config);

        let markdown = match html_to_markdown(&extracted.content_html) {
            Ok(markdown) => markdown,
            Err(e) => {
                warn!(url = %entry.url, error = %e, "conversion failed, skipping");
                state.errors += 1;
                return Ok(());
            }
        };

        let hash = compute_hash(&markdown);
        let changed = !self.config.diff_mode || prior.is_changed(&entry.url, &hash);

        if changed {
            let path = self.allocate_page_path(
                &entry.url,
                extracted.title.as_deref(),
                prior,
                &mut state.next_ordinal,
            );
            store.write_page(&path, &markdown)?;

            info!(url = %entry.url, depth = entry.depth, path = %path, "saved page");
            state.index.push_page(PageRecord {
                url: entry.url.clone(),
                title: extracted.title,
                path,
                depth: entry.depth,
                links: links.clone(),
                metadata: extracted.metadata,
                content_hash: hash,
                crawled_at: Utc::now(),
            });
        } else {
            state.skipped_unchanged += 1;
            state.unchanged.push(entry.url.clone());
            info!(url = %entry.url, "content unchanged, skipping write");
        }

        state.bodies.insert(entry.url.clone(), markdown);

        // Reversed so the first-extracted link pops first
        for link in links.into_iter().rev() {
            stack.push(StackEntry {
                url: link,
                depth: entry.depth + 1,
            });
        }

        Ok(())
    }

    /// Handles a non-hypertext fetch: spec detection and persistence
    ///
    /// Never recurses, whatever the resource turns out to be.
    fn process_resource(
        &self,
        entry: &StackEntry,
        fetched: &FetchedPage,
        store: &mut OutputCommitStore,
        state: &mut RunState,
    ) -> Result<()> {
        let Some(kind) = detect_spec_kind(&entry.url) else {
            debug!(
                url = %entry.url,
                content_type = %fetched.content_type,
                "non-HTML content without spec signature, skipping"
            );
            return Ok(());
        };

        let Ok(url) = Url::parse(&entry.url) else {
            return Ok(());
        };

        // A rendering backend wraps raw resources in viewer HTML
        let body = unwrap_rendered_text(&fetched.html);
        let path = store.write_spec(&url, &body)?;

        info!(url = %entry.url, kind = %kind, path = %path, "saved spec resource");
        state.index.push_spec(SpecRecord {
            url: entry.url.clone(),
            kind,
            path,
        });

        Ok(())
    }

    /// Robots admission for one URL, fetching the host's robots.txt on
    /// first contact
    ///
    /// Any failure to obtain or parse robots.txt resolves permissive, and
    /// the permissive engine is cached so the host is not re-asked.
    async fn robots_allow(&mut self, url: &str, cache: &mut RobotsCache) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return true;
        };
        let Some(robots_url) = robots_txt_url(&parsed) else {
            return true;
        };

        if !cache.contains(&robots_url) {
            let engine = self.fetch_robots(&robots_url).await;
            cache.insert(robots_url.clone(), engine);
        }

        match cache.get(&robots_url) {
            Some(engine) => engine.is_allowed(url),
            None => true,
        }
    }

    async fn fetch_robots(&mut self, robots_url: &str) -> RobotsRuleEngine {
        let attempt = timeout(self.config.fetch_timeout, self.backend.fetch(robots_url)).await;

        match attempt {
            Ok(Ok(Some(page))) => {
                debug!(url = %robots_url, "fetched robots.txt");
                RobotsRuleEngine::parse(&page.html, &self.config.user_agent)
            }
            Ok(Ok(None)) => {
                debug!(url = %robots_url, "no robots.txt, allowing all");
                RobotsRuleEngine::allow_all(&self.config.user_agent)
            }
            Ok(Err(e)) => {
                debug!(url = %robots_url, error = %e, "robots.txt fetch failed, allowing all");
                RobotsRuleEngine::allow_all(&self.config.user_agent)
            }
            Err(_) => {
                debug!(url = %robots_url, "robots.txt fetch timed out, allowing all");
                RobotsRuleEngine::allow_all(&self.config.user_agent)
            }
        }
    }

    /// Picks the output path for a page
    ///
    /// Diff runs keep a URL's prior path so carried-over records never
    /// collide with rewritten files; new URLs number after the highest
    /// prior ordinal.
    fn allocate_page_path(
        &self,
        url: &str,
        title: Option<&str>,
        prior: &DiffStore,
        next_ordinal: &mut usize,
    ) -> String {
        if self.config.diff_mode {
            if let Some(record) = prior.prior_record(url) {
                return record.path.clone();
            }
        }

        let path = layout::page_relative_path(*next_ordinal, title);
        *next_ordinal += 1;
        path
    }

    /// Writes the index and derived documents, then promotes the output
    fn commit(&self, store: &mut OutputCommitStore, state: &RunState) -> Result<()> {
        store.write_index(&state.index)?;

        if self.config.emit_merged || self.config.emit_chunks {
            let merged = crate::postprocess::build_merged(&state.index.pages, &state.bodies);

            if self.config.emit_merged {
                store.write_merged(&merged)?;
            }
            if self.config.emit_chunks {
                store.write_chunks(&crate::postprocess::chunk_document(&merged))?;
            }
        }

        store.finalize()
    }
}
