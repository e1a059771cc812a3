use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Spidey
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub scope: ScopeConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of pages to crawl successfully
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Number of concurrent workers (0 = available parallelism)
    #[serde(default)]
    pub workers: usize,

    /// Pause each worker takes after finishing a page (milliseconds)
    #[serde(default)]
    pub delay_ms: u64,

    /// Total timeout for a single request (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Only follow links whose registrable domain belongs to a seed
    #[serde(default)]
    pub restrict_to_seeds: bool,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl CrawlerConfig {
    /// Resolves the worker count, falling back to available parallelism
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            workers: 0,
            delay_ms: 0,
            request_timeout_secs: default_request_timeout(),
            restrict_to_seeds: false,
            user_agent: default_user_agent(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory that receives the `<date>/<domain>/` tree
    #[serde(default = "default_output_root")]
    pub root: PathBuf,

    /// Replace downloaded resource names with generated unique names
    #[serde(default = "default_true")]
    pub unique_file_names: bool,

    /// Resource extensions to download (e.g. ".pdf"); empty disables downloads
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_output_root(),
            unique_file_names: true,
            extensions: Vec::new(),
        }
    }
}

/// Crawl scope: where to start and what to avoid
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    /// Seed URLs, crawled first and in order
    pub seeds: Vec<String>,

    /// Domains never crawled; entries may use a "*.example.com" wildcard
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_max_pages() -> usize {
    1000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("spidey/{}", env!("CARGO_PKG_VERSION"))
}

fn default_output_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_true() -> bool {
    true
}
