//! Rewriting of mirrored documents for offline browsing
//!
//! Every same-host link is replaced with the path of its local copy,
//! relative to the file that will hold the document being rewritten.
//! Off-host links, empty values and fragment-only values are left alone.
//! The document is streamed through `lol_html`, so all bytes outside the
//! rewritten attributes are preserved.

use crate::crawler::parser::{link_selector, LINK_ATTRIBUTES};
use crate::url::{is_extensionless_page, is_fetchable, relative_local_path, same_host, INDEX_FILE};
use crate::{Result, WgetError};
use lol_html::{element, HtmlRewriter, Settings};
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Rewrites the in-scope links of an HTML document
///
/// # Arguments
///
/// * `html` - The original document bytes
/// * `current_url` - The URL the document was fetched from
/// * `base_url` - The root URL of the mirror, which defines the host scope
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - The rewritten document
/// * `Err(WgetError::HtmlRewrite)` - The rewriter failed; callers keep the
///   original bytes
///
/// # Example
///
/// ```
/// use rwget::crawler::rewrite_document;
/// use url::Url;
///
/// let current = Url::parse("https://example.com/docs/intro.html").unwrap();
/// let base = Url::parse("https://example.com/").unwrap();
/// let html = br#"<a href="/docs/setup.html#install">Setup</a><a href="https://other.org/">Out</a>"#;
///
/// let out = rewrite_document(html, &current, &base).unwrap();
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     r#"<a href="setup.html#install">Setup</a><a href="https://other.org/">Out</a>"#
/// );
/// ```
pub fn rewrite_document(html: &[u8], current_url: &Url, base_url: &Url) -> Result<Vec<u8>> {
    let current_local = relative_local_path(current_url);
    let current_local = current_local.as_path();

    let selectors: Vec<(String, &'static str)> = LINK_ATTRIBUTES
        .iter()
        .map(|(tag, attribute)| (link_selector(tag, attribute), *attribute))
        .collect();

    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: selectors
                .iter()
                .map(|(selector, attribute)| {
                    let attribute = *attribute;
                    element!(selector.as_str(), move |el| {
                        if let Some(value) = el.get_attribute(attribute) {
                            if let Some(rewritten) = rewrite_value(&value, current_url, base_url, current_local) {
                                if rewritten != value {
                                    el.set_attribute(attribute, &rewritten)?;
                                }
                            }
                        }
                        Ok(())
                    })
                })
                .collect(),
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter.write(html).map_err(|e| WgetError::HtmlRewrite {
        url: current_url.to_string(),
        message: e.to_string(),
    })?;
    rewriter.end().map_err(|e| WgetError::HtmlRewrite {
        url: current_url.to_string(),
        message: e.to_string(),
    })?;

    Ok(output)
}

/// Computes the replacement for one attribute value, if it is in scope
fn rewrite_value(value: &str, current_url: &Url, base_url: &Url, current_local: &Path) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let target = current_url.join(trimmed).ok()?;
    if !is_fetchable(&target) || !same_host(&target, base_url) {
        return None;
    }

    let target_local = relative_local_path(&target);
    let mut href = if is_extensionless_page(current_url) {
        host_anchored_href(current_local, &target_local)
    } else {
        relative_href(current_local, &target_local)
    };

    if let Some(fragment) = target.fragment() {
        href.push('#');
        href.push_str(fragment);
    }

    Some(href)
}

/// Joins path components with `/`, percent-encoding each file name
fn path_to_href(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(urlencoding::encode(&name.to_string_lossy()).into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::CurDir => Some(".".to_string()),
            Component::RootDir | Component::Prefix(_) => None,
        })
        .collect();

    if parts.is_empty() {
        return INDEX_FILE.to_string();
    }
    parts.join("/")
}

/// Returns the path of `target` relative to the directory of `current`
///
/// Both arguments are paths relative to the mirror root.
pub fn relative_href(current: &Path, target: &Path) -> String {
    let dir = current.parent().unwrap_or_else(|| Path::new(""));
    match pathdiff::diff_paths(target, dir) {
        Some(relative) => path_to_href(&relative),
        None => format!("/{}", path_to_href(target)),
    }
}

/// Returns an href that climbs from the directory of `current` to the host
/// directory and descends to `target`
///
/// Used for documents stored as an implicit index under a URL without a
/// trailing slash. Resolved against the page URL, the surplus `..` segments
/// stop at the site root, so both readings reach the same target.
fn host_anchored_href(current: &Path, target: &Path) -> String {
    let depth = current
        .parent()
        .map_or(0, |dir| dir.components().count().saturating_sub(1));
    let below_host: PathBuf = target.components().skip(1).collect();

    let mut href = "../".repeat(depth);
    href.push_str(&path_to_href(&below_host));
    href
}
