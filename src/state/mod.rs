//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageOutcome`: the explicit result of handling one dequeued URL
//! - `FailureStage`: where in the pipeline a page was dropped
//! - `SkipReason`: why the frontier passed over a queued URL

mod page_state;

pub use page_state::{FailureStage, PageOutcome, SkipReason};
