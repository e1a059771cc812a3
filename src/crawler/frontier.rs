//! Crawl frontier: the pending queue, the visited set and the crawl counters
//!
//! All shared crawl state lives in one `Frontier` behind a single mutex. Its
//! operations are the only way to touch that state, and each one is a single
//! critical section:
//! - `try_dequeue` pops the next in-scope URL and claims it as visited
//! - `mark_visited_and_enqueue` records a crawled page and queues its links
//!
//! URLs are stored in their `normalize`d form, so one page reached through
//! differently spelled URLs (a seed without a trailing slash, a redirect
//! target) is still fetched once.
//! - `mark_failed` releases the slot of a page whose fetch failed
//!
//! Because a URL is claimed in the same step that removes it from the queue,
//! and links are only queued if neither claimed nor already queued, a URL is
//! fetched at most once per crawl no matter how often it is discovered.

use crate::state::SkipReason;
use crate::url::{normalize, DomainPolicy, ScopeDecision};
use std::collections::{HashMap, HashSet, VecDeque};

/// Counters reported after enqueueing a page's links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnqueueSummary {
    /// In-scope links found on the page
    pub links_found: usize,
    /// Links that were new to the frontier
    pub links_added: usize,
    /// Pages crawled so far, including this one
    pub pages_crawled: usize,
    /// URLs discovered so far, seeds included
    pub discovered: usize,
}

/// Point-in-time view of the frontier counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontierStats {
    pub discovered: usize,
    pub pages_crawled: usize,
    pub pages_failed: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub skipped: HashMap<SkipReason, usize>,
}

/// Breadth-first URL frontier
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    policy: DomainPolicy,
    page_limit: usize,
    pages_crawled: usize,
    pages_failed: usize,
    in_flight: usize,
    discovered: usize,
    skipped: HashMap<SkipReason, usize>,
}

impl Frontier {
    /// Creates a frontier seeded in order, dropping duplicate seeds
    pub fn new(seeds: &[String], policy: DomainPolicy, page_limit: usize) -> Self {
        let mut frontier = Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            policy,
            page_limit,
            pages_crawled: 0,
            pages_failed: 0,
            in_flight: 0,
            discovered: 0,
            skipped: HashMap::new(),
        };

        for seed in seeds {
            let seed = normalize(seed);
            if frontier.queued.insert(seed.clone()) {
                frontier.queue.push_back(seed);
                frontier.discovered += 1;
            }
        }

        frontier
    }

    /// Pops the next URL to crawl and claims it
    ///
    /// Already visited and out-of-scope URLs are dropped along the way.
    /// Returns `None` when the queue is drained or when the pages already
    /// crawled plus those in flight would reach the page limit.
    pub fn try_dequeue(&mut self) -> Option<String> {
        while self.has_capacity() {
            let url = self.queue.pop_front()?;
            self.queued.remove(&url);

            if self.visited.contains(&url) {
                self.record_skip(&url, SkipReason::AlreadyVisited);
                continue;
            }

            match self.policy.classify(&url) {
                ScopeDecision::InScope => {}
                ScopeDecision::Excluded => {
                    self.record_skip(&url, SkipReason::Excluded);
                    continue;
                }
                ScopeDecision::OutsideSeeds => {
                    self.record_skip(&url, SkipReason::OutsideSeeds);
                    continue;
                }
                ScopeDecision::NoDomain => {
                    self.record_skip(&url, SkipReason::NoDomain);
                    continue;
                }
            }

            self.visited.insert(url.clone());
            self.in_flight += 1;
            return Some(url);
        }

        None
    }

    /// Records a successfully fetched page and queues its in-scope links
    ///
    /// `url` must have come from `try_dequeue`; `final_url` is where the
    /// fetch ended up after redirects and is claimed as well. Links already
    /// visited or already queued are absorbed silently.
    pub fn mark_visited_and_enqueue<I>(
        &mut self,
        url: &str,
        final_url: &str,
        links: I,
    ) -> EnqueueSummary
    where
        I: IntoIterator<Item = String>,
    {
        self.release(url);
        self.pages_crawled += 1;

        let final_url = normalize(final_url);
        if final_url != url {
            self.visited.insert(final_url);
        }

        let mut links_found = 0;
        let mut links_added = 0;
        for link in links {
            let link = normalize(&link);
            if !self.policy.in_scope(&link) {
                continue;
            }
            links_found += 1;

            if self.visited.contains(&link) || self.queued.contains(&link) {
                continue;
            }

            self.queued.insert(link.clone());
            self.queue.push_back(link);
            links_added += 1;
        }
        self.discovered += links_added;

        EnqueueSummary {
            links_found,
            links_added,
            pages_crawled: self.pages_crawled,
            discovered: self.discovered,
        }
    }

    /// Records a page whose fetch failed; it stays visited and is not retried
    pub fn mark_failed(&mut self, url: &str) {
        self.release(url);
        self.pages_failed += 1;
    }

    /// Filters out URLs that have already been visited
    pub fn unvisited(&self, urls: HashSet<String>) -> HashSet<String> {
        urls.into_iter()
            .filter(|url| !self.visited.contains(&normalize(url)))
            .collect()
    }

    /// Returns true when no more work will ever be handed out
    pub fn is_finished(&self) -> bool {
        self.pages_crawled >= self.page_limit || (self.queue.is_empty() && self.in_flight == 0)
    }

    pub fn stats(&self) -> FrontierStats {
        FrontierStats {
            discovered: self.discovered,
            pages_crawled: self.pages_crawled,
            pages_failed: self.pages_failed,
            queued: self.queue.len(),
            in_flight: self.in_flight,
            skipped: self.skipped.clone(),
        }
    }

    fn has_capacity(&self) -> bool {
        self.pages_crawled + self.in_flight < self.page_limit
    }

    fn release(&mut self, url: &str) {
        debug_assert!(self.visited.contains(url), "{} was never dequeued", url);
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    fn record_skip(&mut self, url: &str, reason: SkipReason) {
        tracing::debug!("Skipping {}: {}", url, reason);
        *self.skipped.entry(reason).or_insert(0) += 1;
    }
}
