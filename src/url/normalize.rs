use crate::UrlError;
use url::Url;

/// Parses a user-supplied target URL
///
/// The URL must be absolute, use the http or https scheme and carry a host.
/// The fragment is dropped since it never reaches the server.
///
/// # Examples
///
/// ```
/// use rwget::url::parse_target_url;
///
/// let url = parse_target_url("https://example.com/docs#intro").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs");
/// assert!(parse_target_url("ftp://example.com/file").is_err());
/// ```
pub fn parse_target_url(input: &str) -> Result<Url, UrlError> {
    let url = Url::parse(input.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", input, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(normalize_url(url))
}

/// Normalizes a discovered URL into its visited-set key
///
/// Only the fragment is removed: `page.html#a` and `page.html#b` are the
/// same resource. Everything else is kept as the server sees it.
pub fn normalize_url(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

/// Returns true if the URL uses a scheme the fetcher can retrieve
pub fn is_fetchable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
