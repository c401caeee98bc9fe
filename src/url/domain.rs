use url::Url;

/// Extracts the host from a URL, lowercased and without the port
///
/// # Examples
///
/// ```
/// use url::Url;
/// use rwget::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM:8080/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if both URLs name the same host
///
/// Only the host name participates; scheme and port are ignored, so
/// `http://example.com` and `https://example.com:8443` are the same site.
/// URLs without a host never match.
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
