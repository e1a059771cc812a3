//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests for page content, collapsed into a `FetchResult`
//! - GET requests for resources, handed back as a streamable response
//!
//! The request timeout bounds a whole page fetch. Resources only get it up
//! to the response headers; their bodies are bounded per chunk by the
//! caller, so large downloads are not cut off while data keeps flowing.

use crate::config::CrawlerConfig;
use crate::SpideyError;
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

/// Upper bound on connection setup, independent of the total timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a page fetch
///
/// Only `Success` carries content; every other variant means "skip this URL".
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Server answered with a non-2xx status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, unreadable body)
    NetworkError {
        /// Error description
        error: String,
    },

    /// The URL could not be requested at all
    InvalidUrl {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Short description of a failed fetch, for logs and outcomes
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::HttpError { status_code } => Some(format!("HTTP {}", status_code)),
            Self::NetworkError { error } => Some(error.clone()),
            Self::InvalidUrl { error } => Some(format!("Invalid URL: {}", error)),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use spidey::config::CrawlerConfig;
/// use spidey::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(CONNECT_TIMEOUT.min(config.request_timeout()))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page as text within `timeout`
///
/// Never fails: every error is folded into a non-success `FetchResult` so
/// the caller can skip the URL uniformly.
pub async fn fetch_url(client: &Client, url: &str, timeout: Duration) -> FetchResult {
    if let Err(e) = Url::parse(url) {
        return FetchResult::InvalidUrl {
            error: e.to_string(),
        };
    }

    let response = match client.get(url).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().to_string();
    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(e) => classify_error(&e),
    }
}

fn classify_error(e: &reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::NetworkError {
            error: "Request timeout".to_string(),
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: "Connection refused".to_string(),
        }
    } else if e.is_builder() {
        FetchResult::InvalidUrl {
            error: e.to_string(),
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
        }
    }
}

/// Shared HTTP access for pages and resources
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Creates a fetcher with a client built from the crawler configuration
    pub fn new(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::from_client(
            build_http_client(config)?,
            config.request_timeout(),
        ))
    }

    /// Wraps an existing client
    pub fn from_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// The configured request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches a page as text
    pub async fn fetch(&self, url: &str) -> FetchResult {
        fetch_url(&self.client, url, self.timeout).await
    }

    /// Starts a resource download
    ///
    /// Returns the response once headers arrive with a 2xx status; the body
    /// is left unread so the caller can stream it. Only the wait for the
    /// headers is bounded by the request timeout.
    pub async fn fetch_resource(&self, url: &str) -> Result<Response, SpideyError> {
        let sent = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| SpideyError::Timeout {
                url: url.to_string(),
            })?;

        let response = sent.map_err(|e| {
            if e.is_timeout() {
                SpideyError::Timeout {
                    url: url.to_string(),
                }
            } else {
                SpideyError::Http {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        response.error_for_status().map_err(|e| SpideyError::Http {
            url: url.to_string(),
            source: e,
        })
    }
}
