//! HTML link extraction
//!
//! This module finds the hyperlink and resource targets of a document:
//! - `<a href>` and `<link href>`
//! - `<img src>` and `<script src>`
//! - `<form action>`
//!
//! The same table drives the rewriter, so every extracted link is also a
//! link that gets rewritten.

use crate::url::{is_fetchable, normalize_url};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Element kinds that carry a navigable or resource attribute
pub const LINK_ATTRIBUTES: [(&str, &str); 5] = [
    ("a", "href"),
    ("link", "href"),
    ("img", "src"),
    ("script", "src"),
    ("form", "action"),
];

/// Returns the CSS selector matching one entry of [`LINK_ATTRIBUTES`]
pub fn link_selector(tag: &str, attribute: &str) -> String {
    format!("{}[{}]", tag, attribute)
}

/// Extracts every http(s) link target from an HTML document
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the document was fetched from
///
/// # Returns
///
/// Absolute URLs in document order, without fragments and without
/// duplicates. Mail links, data URIs, scripts and other schemes are dropped.
///
/// # Example
///
/// ```
/// use rwget::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/about">About</a><img src="logo.png"><a href="mailto:x@y.z">Mail</a>"#;
/// let base = Url::parse("https://example.com/docs/").unwrap();
/// let links = extract_links(html, &base);
///
/// assert_eq!(links.len(), 2);
/// assert_eq!(links[0].as_str(), "https://example.com/about");
/// assert_eq!(links[1].as_str(), "https://example.com/docs/logo.png");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let selectors: Vec<(Selector, &str)> = LINK_ATTRIBUTES
        .iter()
        .filter_map(|(tag, attribute)| {
            Selector::parse(&link_selector(tag, attribute))
                .ok()
                .map(|selector| (selector, *attribute))
        })
        .collect();

    // Walk elements in document order so that results are stable
    for element in document.root_element().descendants().filter_map(scraper::ElementRef::wrap) {
        for (selector, attribute) in &selectors {
            if !selector.matches(&element) {
                continue;
            }
            let Some(value) = element.value().attr(attribute) else {
                continue;
            };
            if let Some(url) = resolve_link(value, base_url) {
                if seen.insert(url.as_str().to_string()) {
                    links.push(url);
                }
            }
        }
    }

    links
}

/// Resolves an attribute value to an absolute, fetchable URL
///
/// Returns None for empty and fragment-only values, values that fail to
/// resolve, and non-http(s) results.
pub fn resolve_link(value: &str, base_url: &Url) -> Option<Url> {
    let value = value.trim();

    if value.is_empty() || value.starts_with('#') {
        return None;
    }

    let absolute = base_url.join(value).ok()?;
    if !is_fetchable(&absolute) {
        return None;
    }

    Some(normalize_url(absolute))
}
