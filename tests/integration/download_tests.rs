//! Integration tests for single and batch downloads

use rwget::config::ClientConfig;
use rwget::crawler::build_http_client;
use rwget::download::{download_batch, download_file, read_url_list, spawn_download, BatchOptions, DownloadRequest};
use rwget::{ProgressMode, WgetError};
use std::io::Write;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> reqwest::Client {
    build_http_client(&ClientConfig::default()).unwrap()
}

fn server_url(server: &MockServer, path: &str) -> Url {
    Url::parse(&server.uri()).unwrap().join(path).unwrap()
}

async fn serve_file(server: &MockServer, file_path: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_vec(), "application/octet-stream"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_download_writes_file() {
    let server = MockServer::start().await;
    serve_file(&server, "/files/data.bin", &[7u8; 4096]).await;

    let dir = tempfile::tempdir().unwrap();
    let request = DownloadRequest::new(server_url(&server, "/files/data.bin")).with_directory(dir.path().join("nested"));

    let report = download_file(&client(), &request, ProgressMode::Terse, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.bytes, 4096);
    assert_eq!(report.path, dir.path().join("nested").join("data.bin"));
    assert_eq!(std::fs::read(&report.path).unwrap(), vec![7u8; 4096]);
    assert!(report.finished_at >= report.started_at);
}

#[tokio::test]
async fn test_single_download_output_name() {
    let server = MockServer::start().await;
    serve_file(&server, "/latest", b"payload").await;

    let dir = tempfile::tempdir().unwrap();
    let request = DownloadRequest::new(server_url(&server, "/latest"))
        .with_directory(dir.path())
        .with_output_name("release.tar");

    download_file(&client(), &request, ProgressMode::Terse, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(std::fs::read(dir.path().join("release.tar")).unwrap(), b"payload");
}

#[tokio::test]
async fn test_not_found_is_error_and_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.zip"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let request = DownloadRequest::new(server_url(&server, "/missing.zip")).with_directory(dir.path());

    let err = download_file(&client(), &request, ProgressMode::Terse, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), format!("HTTP 404 Not Found for {}", request.url));
    assert!(!dir.path().join("missing.zip").exists());
}

#[tokio::test]
async fn test_rate_limited_download_is_paced() {
    let server = MockServer::start().await;
    serve_file(&server, "/slow.bin", &[1u8; 8192]).await;

    let dir = tempfile::tempdir().unwrap();
    let request = DownloadRequest::new(server_url(&server, "/slow.bin"))
        .with_directory(dir.path())
        .with_rate_limit(16 * 1024);

    let start = Instant::now();
    let report = download_file(&client(), &request, ProgressMode::Terse, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.bytes, 8192);
    assert!(start.elapsed() >= Duration::from_millis(400), "{:?}", start.elapsed());
}

#[tokio::test]
async fn test_spawned_download_completes() {
    let server = MockServer::start().await;
    serve_file(&server, "/bg.txt", b"background").await;

    let dir = tempfile::tempdir().unwrap();
    let request = DownloadRequest::new(server_url(&server, "/bg.txt")).with_directory(dir.path());

    let handle = spawn_download(client(), request, ProgressMode::Terse, CancellationToken::new());
    let report = handle.await.unwrap().unwrap();

    assert_eq!(std::fs::read(report.path).unwrap(), b"background");
}

#[tokio::test]
async fn test_cancelled_download_is_interrupted() {
    let server = MockServer::start().await;
    serve_file(&server, "/never.bin", b"x").await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let dir = tempfile::tempdir().unwrap();
    let request = DownloadRequest::new(server_url(&server, "/never.bin")).with_directory(dir.path());
    let err = download_file(&client(), &request, ProgressMode::Terse, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, WgetError::Interrupted));
}

#[tokio::test]
async fn test_batch_counts_successes() {
    let server = MockServer::start().await;
    serve_file(&server, "/one.txt", b"1").await;
    serve_file(&server, "/two.txt", b"2").await;
    Mock::given(method("GET"))
        .and(path("/three.txt"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let urls: Vec<String> = ["/one.txt", "/two.txt", "/three.txt"]
        .iter()
        .map(|p| server_url(&server, p).to_string())
        .collect();

    let dir = tempfile::tempdir().unwrap();
    let options = BatchOptions {
        directory: Some(dir.path().to_path_buf()),
        max_concurrent: 2,
        rate_limit: 0,
    };

    let summary = download_batch(&client(), &urls, &options, &CancellationToken::new()).await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, urls[2]);
    assert!(!summary.all_succeeded());
    assert_eq!(summary.to_string(), "Download summary: 2/3 files downloaded successfully");

    assert_eq!(std::fs::read(dir.path().join("one.txt")).unwrap(), b"1");
    assert_eq!(std::fs::read(dir.path().join("two.txt")).unwrap(), b"2");
    assert!(!dir.path().join("three.txt").exists());
}

#[tokio::test]
async fn test_batch_from_url_list_file() {
    let server = MockServer::start().await;
    serve_file(&server, "/a.txt", b"a").await;
    serve_file(&server, "/b.txt", b"b").await;

    let mut list = tempfile::NamedTempFile::new().unwrap();
    writeln!(list, "  {}  ", server_url(&server, "/a.txt")).unwrap();
    writeln!(list).unwrap();
    writeln!(list, "{}", server_url(&server, "/b.txt")).unwrap();

    let urls = read_url_list(list.path()).await.unwrap();
    assert_eq!(urls.len(), 2);

    let dir = tempfile::tempdir().unwrap();
    let options = BatchOptions {
        directory: Some(dir.path().to_path_buf()),
        ..BatchOptions::default()
    };
    let summary = download_batch(&client(), &urls, &options, &CancellationToken::new()).await;

    assert!(summary.all_succeeded());
    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("b.txt").exists());
}
