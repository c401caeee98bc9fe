//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests, for the mirror as well as for
//! single and batch downloads:
//! - Building the shared HTTP client
//! - Issuing one GET per URL, with no retries
//! - Strict status validation (only 200 is a success)
//! - Streaming the body through the rate limiter into a sink

use crate::config::ClientConfig;
use crate::transfer::RateLimiter;
use crate::{Result, WgetError};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use url::Url;

/// A validated response whose body has not been read yet
#[derive(Debug)]
pub struct FetchResponse {
    /// The requested URL
    pub url: Url,

    /// HTTP status code, always 200
    pub status: StatusCode,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Announced body size, if any
    pub content_length: Option<u64>,

    response: Response,
}

impl FetchResponse {
    /// Returns true if the response carries an HTML document
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().map_or(false, is_html_content_type)
    }

    /// Reads the whole body into memory, throttled by `limiter`
    pub async fn read_to_end(self, limiter: RateLimiter, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let mut body = Vec::with_capacity(self.content_length.unwrap_or(0).min(16 * 1024 * 1024) as usize);
        self.stream_into(&mut body, limiter, cancel).await?;
        Ok(body)
    }

    /// Streams the body into `sink`, throttled by `limiter`
    ///
    /// # Arguments
    ///
    /// * `sink` - The destination, usually a progress-observed file
    /// * `limiter` - The rate limiter applied before the sink
    /// * `cancel` - Checked between chunks
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Number of bytes written
    /// * `Err(WgetError::Interrupted)` - Cancellation was requested
    /// * `Err(WgetError::Http)` - The connection failed mid-body
    /// * `Err(WgetError::Io)` - Writing to the sink failed
    pub async fn stream_into<W>(self, sink: &mut W, limiter: RateLimiter, cancel: &CancellationToken) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let url = self.url;
        let stream = limiter.throttle(self.response.bytes_stream());
        tokio::pin!(stream);

        let mut written = 0u64;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WgetError::Interrupted),
                next = stream.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };

            let chunk = chunk.map_err(|source| WgetError::Http {
                url: url.to_string(),
                source,
            })?;
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        sink.flush().await?;
        Ok(written)
    }
}

/// Returns true if a Content-Type value names an HTML document
///
/// Only the media type participates: parameters such as `charset` are
/// ignored and the comparison is case-insensitive.
pub fn is_html_content_type(value: &str) -> bool {
    let media_type = value.split(';').next().unwrap_or("").trim();
    media_type.eq_ignore_ascii_case("text/html")
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The client section of the configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use rwget::config::ClientConfig;
/// use rwget::crawler::build_http_client;
///
/// let client = build_http_client(&ClientConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ClientConfig) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends one GET request and validates the response status
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
///
/// # Returns
///
/// * `Ok(FetchResponse)` - The server answered 200
/// * `Err(WgetError::Status)` - Any other status, including 404
/// * `Err(WgetError::Http)` - Transport failure (DNS, connect, TLS)
pub async fn fetch(client: &Client, url: &Url) -> Result<FetchResponse> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| WgetError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(WgetError::Status {
            url: url.to_string(),
            status,
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let content_length = response.content_length();

    Ok(FetchResponse {
        url: url.clone(),
        status,
        content_type,
        content_length,
        response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        build_http_client(&ClientConfig::default()).unwrap()
    }

    #[test]
    fn test_html_content_type() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("  TEXT/HTML ;charset=ISO-8859-1"));
        assert!(!is_html_content_type("application/xhtml+xml"));
        assert!(!is_html_content_type("text/htmlx"));
        assert!(!is_html_content_type("image/png"));
        assert!(!is_html_content_type(""));
    }

    #[tokio::test]
    async fn test_fetch_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page.html"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<p>hi</p>", "text/html; charset=utf-8"))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/page.html", server.uri())).unwrap();
        let response = fetch(&client(), &url).await.unwrap();
        assert!(response.is_html());

        let body = response
            .read_to_end(RateLimiter::unlimited(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(body, b"<p>hi</p>");
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let err = fetch(&client(), &url).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_non_200_success_is_still_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/empty", server.uri())).unwrap();
        let err = fetch(&client(), &url).await.unwrap_err();
        assert!(matches!(err, WgetError::Status { status, .. } if status == StatusCode::NO_CONTENT));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_not_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/blob", server.uri())).unwrap();
        let response = fetch(&client(), &url).await.unwrap();
        assert!(!response.is_html());
    }

    #[tokio::test]
    async fn test_cancelled_stream_stops() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 1024]))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/big.bin", server.uri())).unwrap();
        let response = fetch(&client(), &url).await.unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = response
            .read_to_end(RateLimiter::unlimited(), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_interrupted());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind and drop a listener to get a port nobody is listening on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
        let err = fetch(&client(), &url).await.unwrap_err();
        assert!(matches!(err, WgetError::Http { .. }));
    }
}
