//! Storage module for persisting crawled pages
//!
//! This module handles everything written to disk:
//! - The dated, per-domain directory layout
//! - Collision-free file naming
//! - Page content and manifest files
//! - Streaming resource downloads into `files/`
//!
//! Layout under the output root:
//!
//! ```text
//! <root>/<YYYY-MM-DD>/<registrable-domain>/<ts>_<hex>.html
//! <root>/<YYYY-MM-DD>/<registrable-domain>/<ts>_<hex>.json
//! <root>/<YYYY-MM-DD>/<registrable-domain>/files/<resource>
//! ```

mod filesystem;
mod naming;

pub use filesystem::FileStore;
pub use naming::{create_unique, generate_filename, manifest_name};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting a page
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("No registrable domain in {0}")]
    NoDomain(String),

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not find a free file name in {0} after {1} attempts")]
    NamesExhausted(PathBuf, usize),

    #[error("Download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A fetched page ready to be persisted
///
/// Built by the worker that fetched it and not modified once handed to
/// [`FileStore::persist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Webpage {
    /// Absolute URL the page was fetched from
    pub url: String,

    /// Page markup
    pub html: Option<String>,

    /// Absolute URLs of resources embedded in the page
    pub resource_urls: HashSet<String>,
}

impl Webpage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: Some(html.into()),
            resource_urls: HashSet::new(),
        }
    }

    pub fn with_resources(mut self, resource_urls: HashSet<String>) -> Self {
        self.resource_urls = resource_urls;
        self
    }
}

/// Per-page JSON record written next to the content file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Source URL of the page
    pub url: String,

    /// Name of the content file in the same directory
    pub file_name: String,

    /// Saved resources; absent when resource downloading is disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<ManifestFile>>,
}

/// One downloaded resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Absolute URL the resource was downloaded from
    pub url: String,

    /// Name taken from Content-Disposition or the URL path
    pub original_name: String,

    /// Name under `files/`
    pub saved_as: String,
}
