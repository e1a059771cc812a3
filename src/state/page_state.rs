/// Page outcome definitions for tracking crawl progress
///
/// Every URL a worker takes from the frontier ends in exactly one outcome.
use std::fmt;

/// Why the frontier passed over a queued URL without dispatching it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// URL was already claimed by an earlier dequeue
    AlreadyVisited,
    /// URL's domain is on the exclusion list
    Excluded,
    /// Crawl is restricted to seed domains and this URL is elsewhere
    OutsideSeeds,
    /// URL has no host
    NoDomain,
}

/// Pipeline stage at which a page was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// HTTP request failed or returned a non-2xx status
    Fetch,
    /// Writing the page or manifest failed
    Persist,
}

/// Result of handling one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Page was fetched, its links enqueued, and persistence attempted
    Crawled {
        url: String,
        /// Number of distinct in-scope links found on the page
        links_found: usize,
        /// Number of resources saved into `files/`
        resources_saved: usize,
        /// False when the page or manifest could not be written
        persisted: bool,
    },

    /// Page was dropped
    Failed {
        url: String,
        stage: FailureStage,
        reason: String,
    },
}

impl PageOutcome {
    /// Returns true if the page counts toward the page limit
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Crawled { .. })
    }

    /// The URL this outcome is about
    pub fn url(&self) -> &str {
        match self {
            Self::Crawled { url, .. } | Self::Failed { url, .. } => url,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AlreadyVisited => "already visited",
            Self::Excluded => "excluded domain",
            Self::OutsideSeeds => "outside seed domains",
            Self::NoDomain => "no domain",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => write!(f, "fetch"),
            Self::Persist => write!(f, "persist"),
        }
    }
}
