//! Crawl report aggregation and display
//!
//! The coordinator folds every `PageOutcome` into a `CrawlReport`, then
//! copies the frontier counters in once the crawl is over.

use crate::state::{FailureStage, PageOutcome, SkipReason};
use std::collections::HashMap;
use std::time::Duration;

/// Summary of a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Pages fetched and parsed successfully (counted toward the page limit)
    pub pages_crawled: usize,

    /// Pages whose fetch failed
    pub pages_failed: usize,

    /// Crawled pages whose HTML or manifest could not be written
    pub pages_unpersisted: usize,

    /// In-scope links found across all crawled pages, duplicates included
    pub links_found: usize,

    /// Resources saved into `files/` folders
    pub resources_saved: usize,

    /// Distinct URLs that entered the frontier, seeds included
    pub urls_discovered: usize,

    /// URLs still waiting in the queue when the crawl stopped
    pub urls_left_queued: usize,

    /// Queued URLs dropped without being fetched, by reason
    pub skipped: HashMap<SkipReason, usize>,

    /// Fetch failure reasons and their counts
    pub failure_reasons: HashMap<String, usize>,

    /// True when the crawl stopped early because a worker died
    pub aborted: bool,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlReport {
    /// Folds a single page outcome into the report
    pub fn record(&mut self, outcome: &PageOutcome) {
        match outcome {
            PageOutcome::Crawled {
                links_found,
                resources_saved,
                persisted,
                ..
            } => {
                self.pages_crawled += 1;
                self.links_found += links_found;
                self.resources_saved += resources_saved;
                if !persisted {
                    self.pages_unpersisted += 1;
                }
            }
            PageOutcome::Failed { stage, reason, .. } => {
                self.pages_failed += 1;
                let key = match stage {
                    FailureStage::Fetch => reason.clone(),
                    FailureStage::Persist => format!("{}: {}", stage, reason),
                };
                *self.failure_reasons.entry(key).or_insert(0) += 1;
            }
        }
    }

    /// Total number of skipped URLs across all reasons
    pub fn total_skipped(&self) -> usize {
        self.skipped.values().sum()
    }

    /// Crawl throughput in pages per second
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.pages_crawled as f64 / secs
        } else {
            0.0
        }
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Pages crawled: {}", report.pages_crawled);
    println!("  Pages failed: {}", report.pages_failed);
    println!("  URLs discovered: {}", report.urls_discovered);
    println!("  Links found: {}", report.links_found);
    println!("  Resources saved: {}", report.resources_saved);
    if report.urls_left_queued > 0 {
        println!("  Left in queue: {}", report.urls_left_queued);
    }
    println!();

    if report.pages_unpersisted > 0 {
        println!(
            "Pages crawled but not saved: {}\n",
            report.pages_unpersisted
        );
    }

    if !report.skipped.is_empty() {
        println!("Skipped URLs ({}):", report.total_skipped());
        let mut skipped: Vec<_> = report.skipped.iter().collect();
        skipped.sort_by(|a, b| b.1.cmp(a.1));

        for (reason, count) in skipped {
            println!("  {}: {}", reason, count);
        }
        println!();
    }

    if !report.failure_reasons.is_empty() {
        println!("Failures:");
        let mut failures: Vec<_> = report.failure_reasons.iter().collect();
        failures.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (reason, count) in failures {
            println!("  {}: {}", reason, count);
        }
        println!();
    }

    if report.aborted {
        println!("Crawl stopped early after a worker failure\n");
    }

    let attempted = report.pages_crawled + report.pages_failed;
    let success_rate = if attempted > 0 {
        (report.pages_crawled as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages fetched)",
        success_rate, report.pages_crawled, attempted
    );
    println!(
        "Elapsed: {:.1}s ({:.2} pages/sec)",
        report.elapsed.as_secs_f64(),
        report.pages_per_second()
    );
}
