//! HTML parser for extracting links and embedded resources
//!
//! This module handles parsing HTML content to extract:
//! - Navigational links (`<a href>`, `<area href>`)
//! - Resource references (`href`/`src` of images, stylesheets, scripts, media)
//! - The page title, for progress logs
//!
//! References are returned raw; resolving them against the page URL is the
//! crawl engine's job.

use scraper::{Html, Selector};
use std::collections::HashSet;

/// Elements whose `href`/`src` point at embedded resources
const RESOURCE_SELECTOR: &str = "img, link, script, video, audio, source";

/// Elements whose `href` is a navigational link
const LINK_SELECTOR: &str = "a[href], area[href]";

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// The page title (from the <title> tag)
    pub title: Option<String>,

    /// Raw navigational link targets
    pub links: HashSet<String>,

    /// Raw resource references
    pub resources: HashSet<String>,
}

/// Parses HTML content and extracts links, resources and the title
///
/// Missing and empty attributes are dropped; everything else is kept
/// verbatim (after trimming), including fragments and relative paths.
///
/// # Example
///
/// ```
/// use spidey::crawler::parse_html;
///
/// let html = r#"<html><head><title>Test</title><link rel="stylesheet" href="s.css"></head>
///     <body><a href="/page">Link</a><img src="logo.png"></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert!(parsed.links.contains("/page"));
/// assert!(parsed.resources.contains("logo.png"));
/// assert!(parsed.resources.contains("s.css"));
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_attributes(&document, LINK_SELECTOR, &["href"]),
        resources: extract_attributes(&document, RESOURCE_SELECTOR, &["href", "src"]),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collects the non-empty values of `attributes` on every element matching `selector`
fn extract_attributes(document: &Html, selector: &str, attributes: &[&str]) -> HashSet<String> {
    let mut values = HashSet::new();

    let selector = match Selector::parse(selector) {
        Ok(selector) => selector,
        Err(_) => return values,
    };

    for element in document.select(&selector) {
        for attribute in attributes {
            if let Some(value) = element.value().attr(attribute) {
                let value = value.trim();
                if !value.is_empty() {
                    values.insert(value.to_string());
                }
            }
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        assert_eq!(parse_html(html).title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        assert_eq!(parse_html(html).title, None);
    }

    #[test]
    fn test_links_kept_raw() {
        let html = r#"<html><body>
            <a href="https://other.com/page">Absolute</a>
            <a href="/root">Root</a>
            <a href="../up.html">Up</a>
            <a href="sibling.html">Sibling</a>
        </body></html>"#;
        let parsed = parse_html(html);

        assert_eq!(parsed.links.len(), 4);
        assert!(parsed.links.contains("https://other.com/page"));
        assert!(parsed.links.contains("/root"));
        assert!(parsed.links.contains("../up.html"));
        assert!(parsed.links.contains("sibling.html"));
    }

    #[test]
    fn test_area_links() {
        let html = r#"<map><area href="/region" shape="rect"></map>"#;
        assert!(parse_html(html).links.contains("/region"));
    }

    #[test]
    fn test_missing_and_empty_href_dropped() {
        let html = r#"<html><body><a name="anchor">No href</a><a href="">Empty</a><a href="  ">Blank</a></body></html>"#;
        assert!(parse_html(html).links.is_empty());
    }

    #[test]
    fn test_duplicate_links_collapsed() {
        let html = r#"<a href="/same">1</a><a href="/same">2</a>"#;
        assert_eq!(parse_html(html).links.len(), 1);
    }

    #[test]
    fn test_fragment_links_are_not_filtered_here() {
        let html = r##"<a href="#section">Jump</a>"##;
        assert!(parse_html(html).links.contains("#section"));
    }

    #[test]
    fn test_resource_references() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/css/site.css">
            <script src="app.js"></script>
            <script>inline()</script>
        </head><body>
            <img src="images/logo.png">
            <video src="clip.mp4"><source src="clip.webm"></video>
            <audio src="theme.mp3"></audio>
        </body></html>"#;
        let parsed = parse_html(html);

        assert_eq!(parsed.resources.len(), 6);
        for expected in [
            "/css/site.css",
            "app.js",
            "images/logo.png",
            "clip.mp4",
            "clip.webm",
            "theme.mp3",
        ] {
            assert!(parsed.resources.contains(expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_anchor_hrefs_are_not_resources() {
        let html = r#"<a href="/report.pdf">Report</a>"#;
        let parsed = parse_html(html);
        assert!(parsed.resources.is_empty());
        assert!(parsed.links.contains("/report.pdf"));
    }

    #[test]
    fn test_malformed_html_still_parses() {
        let html = r#"<html><body><a href="/ok">unclosed <img src="x.png"<p>"#;
        let parsed = parse_html(html);
        assert!(parsed.links.contains("/ok"));
    }
}
