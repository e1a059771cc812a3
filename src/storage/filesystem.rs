//! Filesystem-backed page store

use crate::config::OutputConfig;
use crate::crawler::Fetcher;
use crate::storage::naming::{create_unique, generate_filename, manifest_name};
use crate::storage::{Manifest, ManifestFile, StorageError, StorageResult, Webpage};
use crate::url::registrable_domain;
use chrono::NaiveDate;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Subdirectory of each domain folder that receives resources
pub const FILES_DIR: &str = "files";

/// Extension of downloads still in progress under a temporary name
const PARTIAL_EXTENSION: &str = "part";

/// Writes pages, manifests and resources under a dated output root
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    crawl_date: NaiveDate,
    extensions: Vec<String>,
    unique_names: bool,
    fetcher: Fetcher,
}

impl FileStore {
    /// Creates a store dated today, downloading resources through `fetcher`
    pub fn new(config: &OutputConfig, fetcher: Fetcher) -> Self {
        Self {
            root: config.root.clone(),
            crawl_date: chrono::Local::now().date_naive(),
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            unique_names: config.unique_file_names,
            fetcher,
        }
    }

    /// Pins the date folder, normally the day the crawl started
    pub fn with_crawl_date(mut self, crawl_date: NaiveDate) -> Self {
        self.crawl_date = crawl_date;
        self
    }

    /// Directory holding everything saved for `domain` in this crawl
    pub fn domain_dir(&self, domain: &str) -> PathBuf {
        self.root
            .join(self.crawl_date.format("%Y-%m-%d").to_string())
            .join(domain)
    }

    /// Resource downloading is enabled by a non-empty allowlist
    pub fn downloads_enabled(&self) -> bool {
        !self.extensions.is_empty()
    }

    /// Returns true if files with this extension may be saved
    pub fn extension_allowed(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.').to_lowercase();
        !extension.is_empty() && self.extensions.contains(&extension)
    }

    /// Persists a page, its manifest and its allowlisted resources
    ///
    /// Resource failures are logged and left out of the manifest. Any error
    /// returned here means the page itself could not be written.
    pub async fn persist(&self, page: &Webpage) -> StorageResult<Manifest> {
        let domain =
            registrable_domain(&page.url).ok_or_else(|| StorageError::NoDomain(page.url.clone()))?;
        let dir = self.domain_dir(&domain);
        let files_dir = dir.join(FILES_DIR);

        tokio::fs::create_dir_all(&files_dir)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: files_dir.clone(),
                source,
            })?;

        let (mut file, file_name) = create_unique(&dir, "html", generate_filename).await?;
        file.write_all(page.html.as_deref().unwrap_or_default().as_bytes())
            .await?;
        file.flush().await?;

        let mut manifest = Manifest {
            url: page.url.clone(),
            file_name,
            files: None,
        };

        if self.downloads_enabled() {
            let mut resource_urls: Vec<&String> = page.resource_urls.iter().collect();
            resource_urls.sort();

            let mut saved = Vec::new();
            for url in resource_urls {
                match self.save_resource(url, &files_dir).await {
                    Ok(Some(entry)) => saved.push(entry),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!("Skipping resource {} of {}: {}", url, page.url, e);
                    }
                }
            }
            manifest.files = Some(saved);
        }

        let manifest_path = dir.join(manifest_name(&manifest.file_name));
        tokio::fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?).await?;

        tracing::debug!(
            "Saved {} as {} ({} resources)",
            page.url,
            dir.join(&manifest.file_name).display(),
            manifest.files.as_ref().map_or(0, Vec::len)
        );

        Ok(manifest)
    }

    /// Downloads one resource into `files_dir`
    ///
    /// Returns `Ok(None)` when the resource's extension is not allowlisted.
    async fn save_resource(
        &self,
        url: &str,
        files_dir: &Path,
    ) -> StorageResult<Option<ManifestFile>> {
        let response = self
            .fetcher
            .fetch_resource(url)
            .await
            .map_err(|e| StorageError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let original_name = content_disposition_filename(response.headers())
            .or_else(|| filename_from_url(url))
            .unwrap_or_default();
        let extension = extension_of(&original_name);

        if !self.extension_allowed(&extension) {
            tracing::trace!("Resource {} has no allowlisted extension", url);
            return Ok(None);
        }

        // Original names are written under a temporary name and renamed
        // into place once complete; two downloads never share a file.
        let (file, written_as) = if self.unique_names {
            create_unique(files_dir, &extension, generate_filename).await?
        } else {
            create_unique(files_dir, PARTIAL_EXTENSION, generate_filename).await?
        };

        let written = files_dir.join(&written_as);
        let idle_timeout = self.fetcher.timeout();
        if let Err(e) = stream_to_file(url, response.bytes_stream(), file, idle_timeout).await {
            let _ = tokio::fs::remove_file(&written).await;
            return Err(e);
        }

        let saved_as = if self.unique_names {
            written_as
        } else {
            let name = sanitize_filename::sanitize(&original_name);
            if let Err(e) = tokio::fs::rename(&written, files_dir.join(&name)).await {
                let _ = tokio::fs::remove_file(&written).await;
                return Err(e.into());
            }
            name
        };

        Ok(Some(ManifestFile {
            url: url.to_string(),
            original_name,
            saved_as,
        }))
    }
}

/// Writes a body stream to disk chunk by chunk
///
/// Fails if no chunk arrives within `idle_timeout`; the total duration is
/// unbounded.
async fn stream_to_file<S, B, E>(
    url: &str,
    stream: S,
    mut file: File,
    idle_timeout: Duration,
) -> StorageResult<()>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut stream = std::pin::pin!(stream);

    loop {
        let next = tokio::time::timeout(idle_timeout, stream.next())
            .await
            .map_err(|_| StorageError::Download {
                url: url.to_string(),
                reason: format!("no data for {:?}", idle_timeout),
            })?;

        let chunk = match next {
            Some(chunk) => chunk.map_err(|e| StorageError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?,
            None => break,
        };
        file.write_all(chunk.as_ref()).await?;
    }

    file.flush().await?;
    Ok(())
}

/// Extracts the file name from a Content-Disposition header
///
/// Prefers the RFC 5987 `filename*=` form over plain `filename=`.
pub fn content_disposition_filename(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;

    let mut plain = None;
    let mut extended = None;
    for part in value.split(';') {
        let part = part.trim();
        if let Some(encoded) = part.strip_prefix("filename*=") {
            let name = encoded.rsplit("''").next().unwrap_or(encoded);
            let name = name.trim_matches('"');
            extended = Some(
                urlencoding::decode(name)
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or_else(|_| name.to_string()),
            );
        } else if let Some(name) = part.strip_prefix("filename=") {
            plain = Some(name.trim_matches('"').to_string());
        }
    }

    extended.or(plain).filter(|name| !name.is_empty())
}

/// Last non-empty path segment of a URL
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .next_back()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Lowercase extension of a file name, without the dot
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
