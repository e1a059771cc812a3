//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator owns the shared frontier and a pool of worker tasks. It
//! keeps up to `workers` pages in flight, and each task runs one URL through
//! the whole pipeline:
//! - Fetch the page
//! - Parse HTML and resolve links and resources
//! - Mark the page visited and enqueue new in-scope links
//! - Persist the page, its manifest and allowlisted resources
//!
//! The crawl ends when the frontier has nothing left to hand out and no
//! task is running, or when the page limit has been reached.

use crate::config::{validate, Config};
use crate::crawler::frontier::{Frontier, FrontierStats};
use crate::crawler::parser::parse_html;
use crate::crawler::{FetchResult, Fetcher};
use crate::output::CrawlReport;
use crate::state::{FailureStage, PageOutcome};
use crate::storage::{FileStore, Webpage};
use crate::url::{resolve_all, DomainPolicy};
use crate::SpideyError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Main crawler coordinator structure
pub struct Coordinator {
    frontier: Arc<Mutex<Frontier>>,
    fetcher: Fetcher,
    store: FileStore,
    workers: usize,
    delay: Duration,
}

/// Everything a worker task needs to process one URL
#[derive(Clone)]
struct Worker {
    frontier: Arc<Mutex<Frontier>>,
    fetcher: Fetcher,
    store: FileStore,
    delay: Duration,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// The configuration is validated first, so a crawl with no seeds or
    /// malformed seeds never starts.
    pub fn new(config: Config) -> Result<Self, SpideyError> {
        validate(&config)?;

        let policy = DomainPolicy::from_seeds(
            &config.scope.seeds,
            &config.scope.exclude,
            config.crawler.restrict_to_seeds,
        );
        let mut seed_domains: Vec<_> = policy.seed_domains().iter().cloned().collect();
        seed_domains.sort();
        tracing::info!(
            "Seed domains: {} (restricted: {})",
            seed_domains.join(", "),
            config.crawler.restrict_to_seeds
        );

        let frontier = Frontier::new(&config.scope.seeds, policy, config.crawler.max_pages);
        let fetcher = Fetcher::new(&config.crawler)?;
        let store = FileStore::new(&config.output, fetcher.clone());

        Ok(Self {
            frontier: Arc::new(Mutex::new(frontier)),
            fetcher,
            store,
            workers: config.crawler.effective_workers(),
            delay: config.crawler.delay(),
        })
    }

    /// Replaces the file store, e.g. to pin the crawl date
    pub fn with_store(mut self, store: FileStore) -> Self {
        self.store = store;
        self
    }

    /// The file store pages are written to
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Runs the crawl to completion and returns the report
    pub async fn run(&mut self) -> Result<CrawlReport, SpideyError> {
        tracing::info!("Starting crawl with {} workers", self.workers);

        let start_time = Instant::now();
        let mut report = CrawlReport::default();
        let mut tasks: JoinSet<PageOutcome> = JoinSet::new();
        let mut halted = false;

        loop {
            if !halted {
                self.dispatch(&mut tasks);
            }

            match tasks.join_next().await {
                Some(Ok(outcome)) => {
                    if !outcome.is_success() {
                        tracing::debug!("Dropped {}", outcome.url());
                    }
                    report.record(&outcome);
                }
                Some(Err(e)) => {
                    // A dead task never releases its slot, so stop handing
                    // out work and let the others finish.
                    let err = SpideyError::Worker(e.to_string());
                    tracing::error!("{}; stopping crawl", err);
                    halted = true;
                    report.aborted = true;
                }
                None => break,
            }
        }

        report.elapsed = start_time.elapsed();
        apply_frontier_stats(&mut report, lock(&self.frontier).stats());

        tracing::info!(
            "Crawl completed: {} pages crawled, {} failed in {:?}",
            report.pages_crawled,
            report.pages_failed,
            report.elapsed
        );

        Ok(report)
    }

    /// Tops the task set up to the worker count
    fn dispatch(&self, tasks: &mut JoinSet<PageOutcome>) {
        while tasks.len() < self.workers {
            let next = lock(&self.frontier).try_dequeue();
            let url = match next {
                Some(url) => url,
                None => break,
            };

            tracing::debug!("Processing URL: {}", url);
            let worker = self.worker();
            tasks.spawn(async move { worker.process_url(url).await });
        }
    }

    fn worker(&self) -> Worker {
        Worker {
            frontier: Arc::clone(&self.frontier),
            fetcher: self.fetcher.clone(),
            store: self.store.clone(),
            delay: self.delay,
        }
    }
}

impl Worker {
    /// Runs one URL through fetch, parse, enqueue and persist
    async fn process_url(self, url: String) -> PageOutcome {
        let (base, body) = match self.fetcher.fetch(&url).await {
            FetchResult::Success {
                final_url, body, ..
            } => (final_url, body),
            failure => {
                let reason = failure.failure_reason().unwrap_or_default();
                lock(&self.frontier).mark_failed(&url);
                tracing::warn!("Skipping {}: {}", url, reason);
                return PageOutcome::Failed {
                    url,
                    stage: FailureStage::Fetch,
                    reason,
                };
            }
        };

        let parsed = parse_html(&body);
        let links = resolve_all(&base, &parsed.links);

        let summary = lock(&self.frontier).mark_visited_and_enqueue(&url, &base, links);
        tracing::info!(
            "Found {} URLs on {} [{}] ({} visited / {} discovered)",
            summary.links_found,
            url,
            parsed.title.as_deref().unwrap_or("untitled"),
            summary.pages_crawled,
            summary.discovered
        );

        let resources = lock(&self.frontier).unvisited(resolve_all(&base, &parsed.resources));
        let page = Webpage::new(url.clone(), body).with_resources(resources);

        let (persisted, resources_saved) = match self.store.persist(&page).await {
            Ok(manifest) => (true, manifest.files.map_or(0, |files| files.len())),
            Err(e) => {
                tracing::error!(
                    stage = %FailureStage::Persist,
                    "Failed to save {}: {}",
                    url,
                    e
                );
                (false, 0)
            }
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        PageOutcome::Crawled {
            url,
            links_found: summary.links_found,
            resources_saved,
            persisted,
        }
    }
}

/// Locks the frontier, recovering the state if a holder panicked
fn lock(frontier: &Mutex<Frontier>) -> MutexGuard<'_, Frontier> {
    frontier.lock().unwrap_or_else(PoisonError::into_inner)
}

fn apply_frontier_stats(report: &mut CrawlReport, stats: FrontierStats) {
    report.urls_discovered = stats.discovered;
    report.urls_left_queued = stats.queued;
    report.skipped = stats.skipped;
}

/// Runs the main crawl operation
///
/// # Example
///
/// ```no_run
/// use spidey::config::load_config;
/// use spidey::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("spidey.toml"))?;
/// let report = run_crawl(config).await?;
/// println!("{} pages crawled", report.pages_crawled);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlReport, SpideyError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
