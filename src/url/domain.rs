use url::{Host, Url};

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use spidey::url::extract_host;
///
/// let url = Url::parse("https://Blog.Example.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("blog.example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Reduces a URL to its registrable domain
///
/// The registrable domain is the public suffix plus one label, so
/// `https://blog.example.co.uk/a` becomes `example.co.uk`. IP addresses and
/// hosts without a public suffix (such as `localhost`) are returned as-is.
/// Returns `None` when the string is not an absolute URL with a host.
///
/// # Examples
///
/// ```
/// use spidey::url::registrable_domain;
///
/// assert_eq!(
///     registrable_domain("https://www.example.com/page"),
///     Some("example.com".to_string())
/// );
/// assert_eq!(
///     registrable_domain("http://127.0.0.1:8080/"),
///     Some("127.0.0.1".to_string())
/// );
/// assert_eq!(registrable_domain("/relative/path"), None);
/// ```
pub fn registrable_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    match parsed.host()? {
        Host::Domain(domain) => Some(domain_of_host(&domain.to_lowercase())),
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
    }
}

fn domain_of_host(host: &str) -> String {
    let host = host.trim_end_matches('.');
    if let Some(domain) = psl::domain_str(host) {
        return domain.to_string();
    }

    // No public suffix match: keep the last two labels, or the bare host
    let labels: Vec<&str> = host.rsplitn(3, '.').collect();
    if labels.len() >= 2 {
        format!("{}.{}", labels[1], labels[0])
    } else {
        host.to_string()
    }
}
