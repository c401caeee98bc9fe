//! Integration tests for the site mirror
//!
//! These tests use wiremock to serve a small site and run the full mirror
//! cycle into a temporary directory.

use rwget::config::ClientConfig;
use rwget::crawler::{build_http_client, run_mirror, MirrorOptions};
use rwget::url::{local_path, mirror_root};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

fn options(dir: &Path) -> MirrorOptions {
    MirrorOptions {
        output_dir: Some(dir.to_path_buf()),
        ..MirrorOptions::default()
    }
}

/// Local file for `path` on the mock server, under the mirror root in `dir`
fn local_file(server: &MockServer, dir: &Path, path: &str) -> PathBuf {
    let root = Url::parse(&server.uri()).unwrap();
    let target = root.join(path).unwrap();
    local_path(&target, &mirror_root(&root, Some(dir)))
}

async fn mirror(server: &MockServer, start: &str, options: MirrorOptions) -> rwget::MirrorReport {
    let client = build_http_client(&ClientConfig::default()).unwrap();
    let root = Url::parse(&server.uri()).unwrap().join(start).unwrap();
    run_mirror(client, root, options, CancellationToken::new())
        .await
        .expect("mirror run failed")
}

#[tokio::test]
async fn test_mirror_small_site() {
    let server = MockServer::start().await;
    let external = MockServer::start().await;
    let external_port = Url::parse(&external.uri()).unwrap().port().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&format!(
            r#"<html><head><link href="/style.css" rel="stylesheet"></head>
<body><a href="/about.html">About</a> <a href="http://localhost:{}/elsewhere.html">Out</a>
<img src="/logo.png"></body></html>"#,
            external_port
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about.html"))
        .respond_with(html(r#"<html><body><a href="/">Home</a></body></html>"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/style.css"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"body { color: black; }".to_vec(), "text/css"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&external)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let report = mirror(&server, "/", options(dir.path())).await;

    assert_eq!(report.visited, 4);
    assert_eq!(report.fetched, report.visited);
    assert_eq!(report.documents, 2);
    assert_eq!(report.resources, 2);
    assert_eq!(report.failed, 0);
    assert!(!report.interrupted);

    let index = std::fs::read_to_string(local_file(&server, dir.path(), "/")).unwrap();
    assert!(index.contains(r#"href="about.html""#), "{}", index);
    assert!(index.contains(r#"href="style.css""#), "{}", index);
    assert!(index.contains(r#"src="logo.png""#), "{}", index);
    assert!(index.contains(&format!("http://localhost:{}/elsewhere.html", external_port)));

    let about = std::fs::read_to_string(local_file(&server, dir.path(), "/about.html")).unwrap();
    assert!(about.contains(r#"href="index.html""#), "{}", about);

    let logo = std::fs::read(local_file(&server, dir.path(), "/logo.png")).unwrap();
    assert_eq!(logo, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_rejected_extension_not_fetched() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/photo.PNG">p</a><a href="/private/a.html">x</a><a href="/notes.txt">n</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/photo.PNG"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private/a.html"))
        .respond_with(html("<p>secret</p>"))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/notes.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"notes".to_vec(), "text/plain"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut options = options(dir.path());
    options.reject = vec!["png".to_string()];
    options.exclude = vec!["/private".to_string()];

    let report = mirror(&server, "/", options).await;

    assert_eq!(report.visited, 2);
    assert!(!local_file(&server, dir.path(), "/photo.PNG").exists());
    assert!(local_file(&server, dir.path(), "/notes.txt").exists());
}

#[tokio::test]
async fn test_missing_child_leaves_dangling_link() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/gone.html">gone</a>"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let report = mirror(&server, "/", options(dir.path())).await;

    assert_eq!(report.visited, 2);
    assert_eq!(report.documents, 1);
    assert_eq!(report.failed, 1);
    assert!(!report.interrupted);

    let index = std::fs::read_to_string(local_file(&server, dir.path(), "/")).unwrap();
    assert!(index.contains(r#"href="gone.html""#), "{}", index);
    assert!(!local_file(&server, dir.path(), "/gone.html").exists());
}

#[tokio::test]
async fn test_shared_links_fetched_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/a.html">a</a><a href="/b.html">b</a><a href="/shared.css">s</a><a href="/shared.css#x">s</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    for page in ["/a.html", "/b.html"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html(r#"<link href="/shared.css"><a href="/">home</a>"#))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/shared.css"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"p {}".to_vec(), "text/css"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let report = mirror(&server, "/", options(dir.path())).await;

    assert_eq!(report.visited, 4);
    assert_eq!(report.fetched, 4);
}

#[tokio::test]
async fn test_depth_bound_respected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/one.html">1</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/one.html"))
        .respond_with(html(r#"<a href="/two.html">2</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/two.html"))
        .respond_with(html(r#"<a href="/three.html">3</a>"#))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut options = options(dir.path());
    options.max_depth = 1;

    let report = mirror(&server, "/", options).await;

    assert_eq!(report.visited, 2);
    assert_eq!(report.depth_skipped, 1);

    // The parent still links to the local path the skipped page would use
    let one = std::fs::read_to_string(local_file(&server, dir.path(), "/one.html")).unwrap();
    assert!(one.contains(r#"href="two.html""#), "{}", one);
}

#[tokio::test]
async fn test_single_permit_completes_deep_site() {
    let server = MockServer::start().await;

    for (page, next) in [("/", "/p1.html"), ("/p1.html", "/p2.html"), ("/p2.html", "/p3.html")] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html(&format!(r#"<a href="{}">next</a><img src="/i{}.png">"#, next, next.len())))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"img".to_vec(), "image/png"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut options = options(dir.path());
    options.max_concurrent = 1;
    options.max_depth = 2;

    let report = tokio::time::timeout(std::time::Duration::from_secs(10), mirror(&server, "/", options))
        .await
        .expect("mirror with one permit did not finish");

    assert!(!report.interrupted);
    assert_eq!(report.failed, 0);
    assert_eq!(report.fetched, report.visited);
}

#[tokio::test]
async fn test_cancelled_mirror_fetches_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html("<a href=\"/a.html\">a</a>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = build_http_client(&ClientConfig::default()).unwrap();
    let root = Url::parse(&server.uri()).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = run_mirror(client, root, options(dir.path()), cancel).await.unwrap();

    assert!(report.interrupted);
    assert_eq!(report.visited, 0);
    assert_eq!(report.fetched, 0);
}
