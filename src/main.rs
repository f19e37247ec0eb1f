//! docrawl main entry point
//!
//! This is the command-line interface for the docrawl documentation crawler.

use clap::{Parser, ValueEnum};
use docrawl::config::{validate_options, BackendKind, CrawlOptions};
use docrawl::fetch::{FetchBackend, HttpFetcher, WebDriverFetcher};
use docrawl::{Crawler, DocrawlError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// docrawl: a documentation-site crawler
///
/// docrawl walks a documentation website through a rendering backend,
/// converts each page to Markdown, and writes an output bundle with
/// per-page files, a merged document, and a JSON index. Output is
/// committed atomically, and diff mode re-crawls incrementally against
/// the previous run.
#[derive(Parser, Debug)]
#[command(name = "docrawl")]
#[command(version)]
#[command(about = "Crawl a documentation site into Markdown", long_about = None)]
struct Cli {
    /// Start URL of the documentation site
    #[arg(value_name = "URL")]
    url: String,

    /// Maximum link depth from the start URL (0 = start page only)
    #[arg(short, long, default_value_t = 5)]
    depth: u32,

    /// Stop after this many pages have been saved
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Output directory
    #[arg(short, long, default_value = "docs-out")]
    output: PathBuf,

    /// Follow links to other hosts as well
    #[arg(long)]
    all_domains: bool,

    /// Only follow URLs matching at least one of these regexes
    #[arg(long, value_name = "REGEX")]
    include: Vec<String>,

    /// Never follow URLs matching any of these regexes
    #[arg(long, value_name = "REGEX")]
    exclude: Vec<String>,

    /// Pause between fetches, in milliseconds
    #[arg(long, default_value_t = 250, value_name = "MS")]
    delay: u64,

    /// Per-fetch timeout, in milliseconds
    #[arg(long, default_value_t = 30_000, value_name = "MS")]
    timeout: u64,

    /// Settle time after navigation before reading the page, in milliseconds
    #[arg(long, default_value_t = 1_000, value_name = "MS")]
    wait: u64,

    /// Re-crawl incrementally, writing only changed pages
    #[arg(long)]
    diff: bool,

    /// Do not write individual page files
    #[arg(long)]
    no_pages: bool,

    /// Do not write the merged full.md document
    #[arg(long)]
    no_merged: bool,

    /// Split the merged document into per-heading chunk files
    #[arg(long)]
    chunks: bool,

    /// Ignore robots.txt disallow rules
    #[arg(long)]
    no_robots: bool,

    /// Which backend performs fetches
    #[arg(long, value_enum, default_value_t = BackendArg::Webdriver)]
    backend: BackendArg,

    /// WebDriver endpoint for the rendered backend
    #[arg(long, default_value = "http://localhost:9515", value_name = "URL")]
    webdriver_url: String,

    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,

    /// Leave the browser session open when the crawl ends
    #[arg(long)]
    keep_session: bool,

    /// User-agent string for fetches and robots.txt matching
    #[arg(long, value_name = "STRING")]
    user_agent: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    /// Rendered fetches through a WebDriver session
    Webdriver,

    /// Plain HTTP fetches, no rendering
    Http,
}

/// Exit code for a crawl stopped by ctrl-c (128 + SIGINT)
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let quiet = cli.quiet;
    let options = options_from_cli(cli);

    let config = match validate_options(options) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid arguments: {}", e);
            return ExitCode::from(2);
        }
    };

    let backend: Box<dyn FetchBackend> = match config.backend {
        BackendKind::WebDriver => Box::new(WebDriverFetcher::new(
            &config.webdriver_url,
            &config.user_agent,
            config.render_wait,
            config.headed,
            config.keep_session,
        )),
        BackendKind::Http => Box::new(HttpFetcher::new(&config.user_agent, config.fetch_timeout)),
    };

    let crawler = Crawler::new(config, backend);
    watch_for_interrupt(crawler.cancel_flag());

    match crawler.run().await {
        Ok(outcome) => {
            if !quiet {
                outcome.stats.print_summary();
                println!("Output: {}", outcome.output_dir.display());
            }
            if outcome.interrupted {
                tracing::warn!("crawl interrupted, output not finalized");
                ExitCode::from(EXIT_INTERRUPTED)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Maps raw CLI flags onto unvalidated crawl options
fn options_from_cli(cli: Cli) -> CrawlOptions {
    CrawlOptions {
        url: cli.url,
        max_depth: cli.depth,
        max_pages: cli.max_pages,
        output_dir: cli.output,
        same_domain_only: !cli.all_domains,
        include: cli.include,
        exclude: cli.exclude,
        delay_ms: cli.delay,
        timeout_ms: cli.timeout,
        wait_ms: cli.wait,
        diff_mode: cli.diff,
        emit_pages: !cli.no_pages,
        emit_merged: !cli.no_merged,
        emit_chunks: cli.chunks,
        respect_robots: !cli.no_robots,
        backend: match cli.backend {
            BackendArg::Webdriver => BackendKind::WebDriver,
            BackendArg::Http => BackendKind::Http,
        },
        webdriver_url: cli.webdriver_url,
        headed: cli.headed,
        keep_session: cli.keep_session,
        user_agent: cli.user_agent,
    }
}

/// Maps a crawl failure onto the documented exit code
///
/// 2 invalid arguments, 3 missing dependency, 4 crawl error, 1 anything
/// else.
fn exit_code_for(error: &DocrawlError) -> u8 {
    match error {
        DocrawlError::Config(_) => 2,
        DocrawlError::Dependency(_) => 3,
        DocrawlError::Http { .. }
        | DocrawlError::Fetch { .. }
        | DocrawlError::Timeout { .. }
        | DocrawlError::Convert(_)
        | DocrawlError::Index(_)
        | DocrawlError::Commit { .. }
        | DocrawlError::Io(_) => 4,
        _ => 1,
    }
}

/// Spawns the ctrl-c watcher
///
/// The first signal requests a graceful stop through the shared flag; a
/// second signal terminates the process immediately.
fn watch_for_interrupt(cancel: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::info!("interrupt received, finishing current page");
        cancel.store(true, Ordering::SeqCst);

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("second interrupt, exiting now");
            std::process::exit(i32::from(EXIT_INTERRUPTED));
        }
    });
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docrawl=info,warn"),
            1 => EnvFilter::new("docrawl=debug,info"),
            2 => EnvFilter::new("docrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
