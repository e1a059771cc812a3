/// Checks if a domain matches a wildcard pattern
///
/// Patterns come in two forms:
/// 1. Exact: "example.com" matches only "example.com"
/// 2. Wildcard: "*.example.com" matches "example.com" and every subdomain
///    ("blog.example.com", "api.v2.example.com")
///
/// # Examples
///
/// ```
/// use spidey::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(!matches_wildcard("example.com", "other.com"));
///
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
/// assert!(!matches_wildcard("*.example.com", "example.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}

/// Checks whether an exclusion entry covers a URL
///
/// Wildcard entries are matched against the full host. Plain entries match
/// either the registrable domain or the exact host, so excluding
/// "example.com" also excludes "blog.example.com", while excluding
/// "blog.example.com" leaves "example.com" crawlable.
pub fn matches_exclusion(pattern: &str, host: &str, registrable: &str) -> bool {
    let pattern = pattern.to_lowercase();
    if pattern.starts_with("*.") {
        matches_wildcard(&pattern, host)
    } else {
        pattern == registrable || pattern == host
    }
}
