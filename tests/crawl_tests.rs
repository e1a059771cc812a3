//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, down to the files left on disk.
//!
//! Mock servers listen on 127.0.0.1, so `http://localhost:PORT/` serves as
//! a second registrable domain pointing at the same server.

use spidey::config::{Config, CrawlerConfig, OutputConfig, ScopeConfig};
use spidey::crawler::{crawl, Coordinator};
use spidey::Manifest;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling from `seeds` into `root`
fn create_test_config(seeds: Vec<String>, root: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_pages: 50,
            workers: 4,
            restrict_to_seeds: true,
            ..Default::default()
        },
        output: OutputConfig {
            root: root.to_path_buf(),
            unique_file_names: true,
            extensions: vec![],
        },
        scope: ScopeConfig {
            seeds,
            exclude: vec![],
        },
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .expect(1)
        .mount(server)
        .await;
}

/// The single date folder's `127.0.0.1` directory
fn domain_dir(root: &Path) -> PathBuf {
    let dates: Vec<_> = std::fs::read_dir(root)
        .expect("output root should exist")
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(dates.len(), 1, "expected one date folder, found {:?}", dates);
    dates[0].join("127.0.0.1")
}

fn read_manifests(dir: &Path) -> Vec<Manifest> {
    let mut manifests: Vec<Manifest> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .map(|path| serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap())
        .collect();
    manifests.sort_by(|a, b| a.url.cmp(&b.url));
    manifests
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    let mut paths: Vec<String> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn test_crawl_stays_within_seed_domains() {
    let server = MockServer::start().await;
    let base = server.uri();
    let port = server.address().port();
    let out = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        &format!(
            r#"<a href="/a.html">A</a>
               <a href="b.html">B</a>
               <a href="http://localhost:{}/other.html">Elsewhere</a>"#,
            port
        ),
    )
    .await;
    mount_page(&server, "/a.html", r#"<a href="/">Home</a>"#).await;
    mount_page(&server, "/b.html", "No links").await;
    Mock::given(method("GET"))
        .and(path("/other.html"))
        .respond_with(html("Should not be crawled"))
        .expect(0)
        .mount(&server)
        .await;

    let report = crawl(create_test_config(vec![format!("{}/", base)], out.path()))
        .await
        .unwrap();

    assert_eq!(report.pages_crawled, 3);
    assert_eq!(report.pages_failed, 0);
    assert_eq!(report.urls_discovered, 3);

    let manifests = read_manifests(&domain_dir(out.path()));
    let urls: Vec<&str> = manifests.iter().map(|m| m.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base),
            format!("{}/a.html", base),
            format!("{}/b.html", base),
        ]
    );
    assert!(manifests.iter().all(|m| m.files.is_none()));

    server.verify().await;
}

#[tokio::test]
async fn test_excluded_domain_not_crawled() {
    let server = MockServer::start().await;
    let port = server.address().port();
    let out = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        &format!(r#"<a href="http://localhost:{}/other.html">Elsewhere</a>"#, port),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/other.html"))
        .respond_with(html("Should not be crawled"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(vec![format!("{}/", server.uri())], out.path());
    config.crawler.restrict_to_seeds = false;
    config.scope.exclude = vec!["localhost".to_string()];

    let report = crawl(config).await.unwrap();

    assert_eq!(report.pages_crawled, 1);
    server.verify().await;
}

#[tokio::test]
async fn test_page_limit_is_exact() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="/p{}.html">P{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", &links).await;
    Mock::given(method("GET"))
        .respond_with(html("Leaf"))
        .mount(&server)
        .await;

    let mut config = create_test_config(vec![format!("{}/", server.uri())], out.path());
    config.crawler.max_pages = 2;

    let report = crawl(config).await.unwrap();

    assert_eq!(report.pages_crawled, 2);
    assert_eq!(requested_paths(&server).await.len(), 2);
    assert_eq!(read_manifests(&domain_dir(out.path())).len(), 2);
}

#[tokio::test]
async fn test_failed_page_is_skipped() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<a href="/missing.html">Gone</a><a href="/ok.html">OK</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/ok.html", r#"<a href="/missing.html">Gone again</a>"#).await;

    let report = crawl(create_test_config(vec![format!("{}/", server.uri())], out.path()))
        .await
        .unwrap();

    assert_eq!(report.pages_crawled, 2);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.failure_reasons.get("HTTP 404"), Some(&1));
    assert_eq!(read_manifests(&domain_dir(out.path())).len(), 2);

    server.verify().await;
}

#[tokio::test]
async fn test_each_url_fetched_once() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", r#"<a href="/c">C</a><a href="/">Home</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/b", r#"<a href="/c">C</a><a href="/a">A</a>"#).await;
    mount_page(&server, "/c", r#"<a href="/">Home</a><a href="/c">Self</a>"#).await;

    let report = crawl(create_test_config(vec![format!("{}/", server.uri())], out.path()))
        .await
        .unwrap();

    assert_eq!(report.pages_crawled, 4);
    assert_eq!(report.urls_discovered, 4);
    assert_eq!(requested_paths(&server).await, vec!["/", "/a", "/b", "/c"]);

    server.verify().await;
}

#[tokio::test]
async fn test_parent_relative_link_followed() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_page(
        &server,
        "/docs/guide/intro.html",
        r#"<a href="../api.html">API</a><a href="./next.html">Next</a>"#,
    )
    .await;
    mount_page(&server, "/docs/api.html", "API reference").await;
    mount_page(&server, "/docs/guide/next.html", "Next chapter").await;

    let seed = format!("{}/docs/guide/intro.html", server.uri());
    let report = crawl(create_test_config(vec![seed], out.path()))
        .await
        .unwrap();

    assert_eq!(report.pages_crawled, 3);
    server.verify().await;
}

#[tokio::test]
async fn test_page_saved_with_manifest() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_page(&server, "/", "<h1>Hello</h1>").await;

    let seed = format!("{}/", server.uri());
    crawl(create_test_config(vec![seed.clone()], out.path()))
        .await
        .unwrap();

    let dir = domain_dir(out.path());
    let manifests = read_manifests(&dir);
    assert_eq!(manifests.len(), 1);

    let manifest = &manifests[0];
    assert_eq!(manifest.url, seed);
    assert!(manifest.file_name.ends_with(".html"));

    let saved = std::fs::read_to_string(dir.join(&manifest.file_name)).unwrap();
    assert_eq!(saved, "<html><body><h1>Hello</h1></body></html>");
    assert!(dir.join("files").is_dir());
}

#[tokio::test]
async fn test_only_allowlisted_resources_saved() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<img src="/logo.png"><script src="/app.js"></script>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/app.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("console.log(1)"))
        .mount(&server)
        .await;

    let mut config = create_test_config(vec![format!("{}/", server.uri())], out.path());
    config.output.extensions = vec!["png".to_string()];

    let report = crawl(config).await.unwrap();
    assert_eq!(report.pages_crawled, 1);
    assert_eq!(report.resources_saved, 1);

    let dir = domain_dir(out.path());
    let manifests = read_manifests(&dir);
    let files = manifests[0].files.as_ref().expect("downloads were enabled");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].url, format!("{}/logo.png", server.uri()));
    assert_eq!(files[0].original_name, "logo.png");
    assert!(files[0].saved_as.ends_with(".png"));
    assert_ne!(files[0].saved_as, "logo.png");

    let bytes = std::fs::read(dir.join("files").join(&files[0].saved_as)).unwrap();
    assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);

    server.verify().await;
}

#[tokio::test]
async fn test_content_disposition_names_resource() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_page(&server, "/", r#"<link rel="alternate" href="/download?id=7">"#).await;
    Mock::given(method("GET"))
        .and(path("/download"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", r#"attachment; filename="report.pdf""#)
                .set_body_string("%PDF-1.4"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(vec![format!("{}/", server.uri())], out.path());
    config.output.extensions = vec!["pdf".to_string()];
    config.output.unique_file_names = false;

    crawl(config).await.unwrap();

    let dir = domain_dir(out.path());
    let manifests = read_manifests(&dir);
    let files = manifests[0].files.as_ref().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].original_name, "report.pdf");
    assert_eq!(files[0].saved_as, "report.pdf");
    assert_eq!(
        std::fs::read_to_string(dir.join("files").join("report.pdf")).unwrap(),
        "%PDF-1.4"
    );

    server.verify().await;
}

#[tokio::test]
async fn test_resource_failure_does_not_drop_page() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_page(&server, "/", r#"<img src="/broken.png">"#).await;
    Mock::given(method("GET"))
        .and(path("/broken.png"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut config = create_test_config(vec![format!("{}/", server.uri())], out.path());
    config.output.extensions = vec!["png".to_string()];

    let report = crawl(config).await.unwrap();

    assert_eq!(report.pages_crawled, 1);
    assert_eq!(report.pages_unpersisted, 0);
    assert_eq!(report.resources_saved, 0);

    let manifests = read_manifests(&domain_dir(out.path()));
    assert_eq!(manifests[0].files, Some(vec![]));
}

#[tokio::test]
async fn test_pinned_crawl_date() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_page(&server, "/", "Dated").await;

    let config = create_test_config(vec![format!("{}/", server.uri())], out.path());
    let coordinator = Coordinator::new(config).unwrap();
    let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    let store = coordinator.store().clone().with_crawl_date(date);
    let mut coordinator = coordinator.with_store(store);

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.pages_crawled, 1);
    let dir = out.path().join("2024-03-09").join("127.0.0.1");
    assert_eq!(read_manifests(&dir).len(), 1);
}

#[tokio::test]
async fn test_delay_between_pages() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", "A").await;
    mount_page(&server, "/b", "B").await;

    let mut config = create_test_config(vec![format!("{}/", server.uri())], out.path());
    config.crawler.workers = 1;
    config.crawler.delay_ms = 300;

    let report = crawl(config).await.unwrap();

    assert_eq!(report.pages_crawled, 3);
    assert!(
        report.elapsed >= Duration::from_millis(2 * 300),
        "three pages with one worker finished in {:?}",
        report.elapsed
    );
    server.verify().await;
}

#[tokio::test]
async fn test_workers_wait_out_delays_in_parallel() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_page(&server, "/one", "One").await;
    mount_page(&server, "/two", "Two").await;

    let seeds = vec![
        format!("{}/one", server.uri()),
        format!("{}/two", server.uri()),
    ];
    let mut config = create_test_config(seeds, out.path());
    config.crawler.workers = 2;
    config.crawler.delay_ms = 1000;

    let report = crawl(config).await.unwrap();

    // Both delays overlap; neither worker blocks the frontier while waiting
    assert_eq!(report.pages_crawled, 2);
    assert!(report.elapsed >= Duration::from_millis(1000));
    assert!(
        report.elapsed < Duration::from_millis(1800),
        "delays ran one after the other: {:?}",
        report.elapsed
    );
    server.verify().await;
}

#[tokio::test]
async fn test_seed_without_trailing_slash_fetched_once() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_page(&server, "/", r#"<a href="/">Home</a><a href="/a">A</a>"#).await;
    mount_page(&server, "/a", r#"<a href="/">Home</a>"#).await;

    // MockServer::uri has no trailing slash
    let report = crawl(create_test_config(vec![server.uri()], out.path()))
        .await
        .unwrap();

    assert_eq!(report.pages_crawled, 2);
    assert_eq!(requested_paths(&server).await, vec!["/", "/a"]);
    server.verify().await;
}

#[tokio::test]
async fn test_redirect_target_fetched_once() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/home"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/home", r#"<a href="/home">Home</a><a href="/about">About</a>"#).await;
    mount_page(&server, "/about", r#"<a href="/home">Home</a>"#).await;

    let seed = format!("{}/start", server.uri());
    let report = crawl(create_test_config(vec![seed], out.path()))
        .await
        .unwrap();

    assert_eq!(report.pages_crawled, 2);
    assert_eq!(
        requested_paths(&server).await,
        vec!["/about", "/home", "/start"]
    );
    server.verify().await;
}
