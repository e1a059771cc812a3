use crate::{UrlError, UrlResult};
use std::collections::HashSet;
use url::Url;

/// Resolves a possibly relative reference against the page it was found on
///
/// # Resolution Rules
///
/// 1. Empty and fragment-only (`#...`) references are rejected
/// 2. Absolute http(s) references (`scheme://host...`) are returned unchanged
/// 3. References with any other scheme (`mailto:`, `javascript:`) are rejected
/// 4. Protocol-relative references (`//host/path`) take the base scheme
/// 5. Root-relative references (`/path`) replace the whole base path
/// 6. Everything else is relative to the base directory: the last path
///    segment of the base is dropped, each leading `../` pops one more
///    directory and each leading `./` is ignored. Climbing above the root
///    is an error.
///
/// # Examples
///
/// ```
/// use spidey::url::resolve;
///
/// let base = "https://a.test/x/y/page.html";
/// assert_eq!(resolve(base, "../z.html").unwrap(), "https://a.test/x/z.html");
/// assert_eq!(resolve(base, "img/logo.png").unwrap(), "https://a.test/x/y/img/logo.png");
/// assert_eq!(resolve(base, "/about").unwrap(), "https://a.test/about");
/// assert!(resolve(base, "#section").is_err());
/// ```
pub fn resolve(base: &str, candidate: &str) -> UrlResult<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() || candidate.starts_with('#') {
        return Err(UrlError::NotNavigable(candidate.to_string()));
    }

    if is_absolute(candidate) {
        return Ok(candidate.to_string());
    }

    if let Some(scheme) = scheme_of(candidate) {
        return Err(if scheme == "http" || scheme == "https" {
            UrlError::Parse(format!("Malformed absolute URL '{}'", candidate))
        } else {
            UrlError::InvalidScheme(scheme)
        });
    }

    let base_url = parse_base(base)?;

    let joined = if candidate.starts_with("//") {
        format!("{}:{}", base_url.scheme(), candidate)
    } else if candidate.starts_with('/') {
        format!("{}{}", origin_of(&base_url)?, candidate)
    } else if candidate.starts_with('?') {
        format!("{}{}{}", origin_of(&base_url)?, base_url.path(), candidate)
    } else {
        join_relative(&base_url, base, candidate)?
    };

    let resolved = Url::parse(&joined)
        .map_err(|e| UrlError::Parse(format!("'{}' resolved to '{}': {}", candidate, joined, e)))?;
    if resolved.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(resolved.to_string())
}

/// Resolves a batch of references, dropping the ones that fail
pub fn resolve_all<'a, I>(base: &str, candidates: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut resolved = HashSet::new();
    for candidate in candidates {
        match resolve(base, candidate) {
            Ok(url) => {
                resolved.insert(url);
            }
            Err(e) => {
                tracing::debug!("Dropping '{}' found on {}: {}", candidate, base, e);
            }
        }
    }
    resolved
}

/// Canonical string form of an absolute URL, used as the frontier key
///
/// Runs the URL through `Url`'s serializer, so `http://Host` and
/// `http://host/` map to the same key. Unparsable input is returned as is
/// and later rejected by the scope check.
///
/// ```
/// use spidey::url::normalize;
///
/// assert_eq!(normalize("http://A.test"), "http://a.test/");
/// assert_eq!(normalize("https://a.test/x/../y"), "https://a.test/y");
/// ```
pub fn normalize(url: &str) -> String {
    Url::parse(url.trim())
        .map(|parsed| parsed.to_string())
        .unwrap_or_else(|_| url.to_string())
}

/// Returns true for well-formed absolute http(s) URLs with a host
fn is_absolute(candidate: &str) -> bool {
    if !candidate.contains("://") {
        return false;
    }

    match Url::parse(candidate) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// Extracts a leading `scheme:` if the reference has one
fn scheme_of(candidate: &str) -> Option<String> {
    let colon = candidate.find(':')?;
    let scheme = &candidate[..colon];

    if scheme.contains(|c: char| matches!(c, '/' | '?' | '#')) {
        return None;
    }

    let mut chars = scheme.chars();
    let first = chars.next()?;
    if first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
    {
        Some(scheme.to_ascii_lowercase())
    } else {
        None
    }
}

fn parse_base(base: &str) -> UrlResult<Url> {
    let url = Url::parse(base.trim())
        .map_err(|e| UrlError::Parse(format!("Invalid base URL '{}': {}", base, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// `scheme://host[:port]` of the base URL
fn origin_of(url: &Url) -> UrlResult<String> {
    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

fn join_relative(base_url: &Url, base: &str, candidate: &str) -> UrlResult<String> {
    let mut directories: Vec<&str> = base_url
        .path_segments()
        .map(|segments| segments.collect())
        .unwrap_or_default();

    // Drop the current resource
    directories.pop();

    let mut rest = candidate;
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("../") {
            if directories.pop().is_none() {
                return Err(UrlError::PathUnderflow {
                    base: base.to_string(),
                    candidate: candidate.to_string(),
                });
            }
            rest = stripped;
        } else if rest == "." {
            rest = "";
        } else if rest == ".." {
            if directories.pop().is_none() {
                return Err(UrlError::PathUnderflow {
                    base: base.to_string(),
                    candidate: candidate.to_string(),
                });
            }
            rest = "";
        } else {
            break;
        }
    }

    let mut joined = origin_of(base_url)?;
    for directory in directories {
        joined.push('/');
        joined.push_str(directory);
    }
    joined.push('/');
    joined.push_str(rest);

    Ok(joined)
}
