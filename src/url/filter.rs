use url::Url;

/// Reject and exclude lists applied to every link discovered during a mirror
///
/// Entries are normalized once at construction: extensions lose a leading
/// dot and are lowercased, and blank entries are dropped from both lists so
/// that a stray comma in `-R png,,jpg` cannot reject every URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRules {
    reject_extensions: Vec<String>,
    exclude_paths: Vec<String>,
}

impl FilterRules {
    /// Creates filter rules from raw reject and exclude entries
    pub fn new<R, X>(reject: R, exclude: X) -> Self
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
        X: IntoIterator,
        X::Item: AsRef<str>,
    {
        let reject_extensions = reject
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        let exclude_paths = exclude
            .into_iter()
            .map(|path| path.as_ref().trim().to_string())
            .filter(|path| !path.is_empty())
            .collect();

        Self {
            reject_extensions,
            exclude_paths,
        }
    }

    /// Returns true if the URL must not be fetched
    pub fn should_reject(&self, url: &str) -> bool {
        should_reject(url, &self.reject_extensions, &self.exclude_paths)
    }

    pub fn reject_extensions(&self) -> &[String] {
        &self.reject_extensions
    }

    pub fn exclude_paths(&self) -> &[String] {
        &self.exclude_paths
    }

    /// Returns true if no rule is configured
    pub fn is_empty(&self) -> bool {
        self.reject_extensions.is_empty() && self.exclude_paths.is_empty()
    }
}

/// Decides whether a discovered URL is excluded from the crawl
///
/// A URL is rejected if the extension of its path's last segment matches any
/// reject entry case-insensitively, or if its path contains any exclude entry
/// as a plain substring. Unparseable URLs are rejected.
///
/// # Examples
///
/// ```
/// use rwget::should_reject;
///
/// let reject = vec!["png".to_string()];
/// let exclude = vec!["/static".to_string()];
///
/// assert!(should_reject("https://example.com/photo.PNG", &reject, &exclude));
/// assert!(!should_reject("https://example.com/photo.apng", &reject, &exclude));
/// assert!(should_reject("https://example.com/static/app.js", &reject, &exclude));
/// assert!(should_reject("::not a url::", &reject, &exclude));
/// ```
pub fn should_reject(url: &str, reject: &[String], exclude: &[String]) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return true;
    };
    let path = parsed.path();

    if let Some(extension) = path_extension(path) {
        let extension = extension.to_lowercase();
        if reject
            .iter()
            .any(|r| r.trim_start_matches('.').to_lowercase() == extension)
        {
            return true;
        }
    }

    exclude
        .iter()
        .any(|pattern| !pattern.is_empty() && path.contains(pattern.as_str()))
}

/// Returns the extension of the last path segment, if any
///
/// `/a/photo.png` yields `png`; `/a/` and `/a/readme` yield nothing.
pub(crate) fn path_extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next()?;
    let (stem, extension) = segment.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reject_by_extension() {
        let reject = strings(&["png", "jpg"]);
        assert!(should_reject("https://example.com/photo.png", &reject, &[]));
        assert!(should_reject("https://example.com/a/b/pic.jpg", &reject, &[]));
        assert!(!should_reject("https://example.com/page.html", &reject, &[]));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let reject = strings(&["PNG"]);
        assert!(should_reject("https://example.com/photo.png", &reject, &[]));
        assert!(should_reject("https://example.com/photo.Png", &reject, &[]));
    }

    #[test]
    fn test_extension_match_is_exact() {
        let reject = strings(&["png"]);
        assert!(!should_reject("https://example.com/anim.apng", &reject, &[]));
        assert!(!should_reject("https://example.com/png", &reject, &[]));
        assert!(!should_reject("https://example.com/png/", &reject, &[]));
    }

    #[test]
    fn test_extension_ignores_query() {
        let reject = strings(&["png"]);
        assert!(should_reject("https://example.com/photo.png?size=2", &reject, &[]));
        assert!(!should_reject("https://example.com/view?file=a.png", &reject, &[]));
    }

    #[test]
    fn test_exclude_by_substring() {
        let exclude = strings(&["/static", "/anything"]);
        assert!(should_reject("https://example.com/static/app.js", &[], &exclude));
        assert!(should_reject("https://example.com/x/anything/y", &[], &exclude));
        assert!(!should_reject("https://example.com/docs/", &[], &exclude));
    }

    #[test]
    fn test_exclude_is_plain_substring() {
        let exclude = strings(&["/a*"]);
        assert!(!should_reject("https://example.com/abc", &[], &exclude));
        assert!(should_reject("https://example.com/a*/b", &[], &exclude));
    }

    #[test]
    fn test_unparseable_url_rejected() {
        assert!(should_reject("not a url", &[], &[]));
        assert!(should_reject("", &[], &[]));
    }

    #[test]
    fn test_no_rules_accepts_everything() {
        assert!(!should_reject("https://example.com/photo.png", &[], &[]));
    }

    #[test]
    fn test_adding_rules_never_unrejects() {
        let urls = [
            "https://example.com/",
            "https://example.com/photo.png",
            "https://example.com/static/app.js",
            "https://example.com/docs/page.HTML",
            "https://example.com/archive.tar.gz",
        ];
        let reject_lists = [
            strings(&[]),
            strings(&["png"]),
            strings(&["png", "html"]),
            strings(&["png", "html", "gz"]),
        ];
        let exclude_lists = [
            strings(&[]),
            strings(&["/static"]),
            strings(&["/static", "/docs"]),
        ];

        // Each list is a prefix of the next, so later pairs are supersets.
        for url in urls {
            for (ri, reject) in reject_lists.iter().enumerate() {
                for (xi, exclude) in exclude_lists.iter().enumerate() {
                    if !should_reject(url, reject, exclude) {
                        continue;
                    }
                    for wider_reject in &reject_lists[ri..] {
                        for wider_exclude in &exclude_lists[xi..] {
                            assert!(
                                should_reject(url, wider_reject, wider_exclude),
                                "{} was un-rejected",
                                url
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_filter_rules_normalize_entries() {
        let rules = FilterRules::new([" .PNG ", "", "jpg"], ["/static", "  "]);
        assert_eq!(rules.reject_extensions(), &["png".to_string(), "jpg".to_string()]);
        assert_eq!(rules.exclude_paths(), &["/static".to_string()]);
        assert!(rules.should_reject("https://example.com/a.png"));
        assert!(!rules.should_reject("https://example.com/a.gif"));
    }

    #[test]
    fn test_empty_filter_rules() {
        let rules = FilterRules::default();
        assert!(rules.is_empty());
        assert!(!rules.should_reject("https://example.com/photo.png"));
    }

    #[test]
    fn test_path_extension() {
        assert_eq!(path_extension("/a/photo.png"), Some("png"));
        assert_eq!(path_extension("/archive.tar.gz"), Some("gz"));
        assert_eq!(path_extension("/a/"), None);
        assert_eq!(path_extension("/readme"), None);
        assert_eq!(path_extension("/.hidden"), None);
        assert_eq!(path_extension("/trailing."), None);
    }
}
