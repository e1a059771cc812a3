//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of pages and resources
//! - HTML parsing and link extraction
//! - The shared frontier of pending and visited URLs
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
pub mod frontier;
mod parser;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, fetch_url, FetchResult, Fetcher};
pub use frontier::{EnqueueSummary, Frontier, FrontierStats};
pub use parser::{parse_html, ParsedPage};

use crate::config::Config;
use crate::output::CrawlReport;
use crate::SpideyError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration
/// 2. Seed the frontier and build the HTTP client
/// 3. Fetch pages with a pool of workers, following in-scope links
/// 4. Save each page and its resources under the output root
/// 5. Return a summary of the run
pub async fn crawl(config: Config) -> Result<CrawlReport, SpideyError> {
    run_crawl(config).await
}
