//! Crawl run statistics

use std::time::Duration;

/// Counters for one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlStats {
    /// Pages persisted this run
    pub pages: usize,

    /// Pages skipped as unchanged (diff mode)
    pub skipped_unchanged: usize,

    /// Spec resources saved
    pub specs: usize,

    /// Per-URL fetch or conversion failures
    pub errors: usize,

    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl CrawlStats {
    /// Prints a human-readable summary to stdout
    pub fn print_summary(&self) {
        println!("=== Crawl Summary ===\n");
        println!("  Pages saved:      {}", self.pages);
        if self.skipped_unchanged > 0 {
            println!("  Pages unchanged:  {}", self.skipped_unchanged);
        }
        if self.specs > 0 {
            println!("  Spec resources:   {}", self.specs);
        }
        println!("  Errors:           {}", self.errors);
        println!("  Duration:         {:.2}s", self.duration.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stats_are_zeroed() {
        let stats = CrawlStats::default();
        assert_eq!(stats.pages, 0);
        assert_eq!(stats.skipped_unchanged, 0);
        assert_eq!(stats.specs, 0);
        assert_eq!(stats.errors, 0);
        assert_eq!(stats.duration, Duration::ZERO);
    }
}
