//! Collision-free file naming
//!
//! Generated names look like `{unix_timestamp}_{20 hex chars}.{ext}`. Files
//! are opened with create-new semantics, so two writers can never end up
//! sharing a name even if they generate the same one.

use crate::storage::{StorageError, StorageResult};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs::{File, OpenOptions};

/// Random bytes in a generated name
const RANDOM_BYTES: usize = 10;

/// Attempts before giving up on finding a free name
pub const MAX_NAME_ATTEMPTS: usize = 32;

/// Generates a `{timestamp}_{random hex}` file name
///
/// An empty extension yields a name without a dot.
///
/// # Example
///
/// ```
/// use spidey::storage::generate_filename;
///
/// let name = generate_filename("html");
/// let (stem, ext) = name.split_once('.').unwrap();
/// assert_eq!(ext, "html");
/// assert_eq!(stem.split_once('_').unwrap().1.len(), 20);
/// ```
pub fn generate_filename(extension: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let random: [u8; RANDOM_BYTES] = rand::random();
    let extension = extension.trim_start_matches('.');

    if extension.is_empty() {
        format!("{}_{}", timestamp, hex::encode(random))
    } else {
        format!("{}_{}.{}", timestamp, hex::encode(random), extension)
    }
}

/// Name of the manifest that accompanies a content file
///
/// ```
/// use spidey::storage::manifest_name;
///
/// assert_eq!(manifest_name("123_ab.html"), "123_ab.json");
/// assert_eq!(manifest_name("123_ab"), "123_ab.json");
/// ```
pub fn manifest_name(file_name: &str) -> String {
    match Path::new(file_name).file_stem() {
        Some(stem) => format!("{}.json", stem.to_string_lossy()),
        None => format!("{}.json", file_name),
    }
}

/// Creates a new file in `dir` under a name from `generate`
///
/// Regenerates the name whenever the file already exists. Returns the open
/// file and the name it was created under.
pub async fn create_unique<F>(
    dir: &Path,
    extension: &str,
    mut generate: F,
) -> StorageResult<(File, String)>
where
    F: FnMut(&str) -> String,
{
    for _ in 0..MAX_NAME_ATTEMPTS {
        let name = generate(extension);
        let path = dir.join(&name);

        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((file, name)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!("File name collision on {}, regenerating", path.display());
            }
            Err(e) => return Err(StorageError::Io(e)),
        }
    }

    Err(StorageError::NamesExhausted(
        dir.to_path_buf(),
        MAX_NAME_ATTEMPTS,
    ))
}
