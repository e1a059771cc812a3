//! Output module for crawl reports
//!
//! This module handles:
//! - Aggregating per-page outcomes into a crawl report
//! - Printing the report at the end of a run

pub mod stats;

pub use stats::{print_report, CrawlReport};
