use crate::url::domain::extract_domain;
use crate::url::filter::path_extension;
use std::path::{Path, PathBuf};
use url::Url;

/// File name used for directory-like URLs
pub const INDEX_FILE: &str = "index.html";

/// Directory name used when the root URL has no host
pub const FALLBACK_ROOT: &str = "mirrored_site";

/// Returns the directory that holds every file of one mirror run
///
/// The root is named for the target site's host and lives inside
/// `output_dir`, or the current directory when none is given.
pub fn mirror_root(root_url: &Url, output_dir: Option<&Path>) -> PathBuf {
    let base = output_dir.unwrap_or_else(|| Path::new("."));
    let name = extract_domain(root_url).unwrap_or_else(|| FALLBACK_ROOT.to_string());
    base.join(name)
}

/// Maps a remote URL to its local file path under a mirror root
///
/// # Arguments
///
/// * `url` - The remote URL
/// * `mirror_root` - The directory returned by [`mirror_root`]
///
/// # Returns
///
/// `mirror_root/<host>/<path>`, where directory-like paths end in
/// `index.html`. The query string does not participate, so the mapping only
/// depends on host and path.
///
/// # Examples
///
/// ```
/// use rwget::local_path;
/// use std::path::Path;
/// use url::Url;
///
/// let root = Path::new("out/example.com");
/// let url = Url::parse("https://example.com/docs/").unwrap();
/// assert_eq!(
///     local_path(&url, root),
///     Path::new("out/example.com/example.com/docs/index.html")
/// );
/// ```
pub fn local_path(url: &Url, mirror_root: &Path) -> PathBuf {
    mirror_root.join(relative_local_path(url))
}

/// Maps a remote URL to a path relative to the mirror root
pub fn relative_local_path(url: &Url) -> PathBuf {
    let mut path = PathBuf::from(extract_domain(url).unwrap_or_else(|| FALLBACK_ROOT.to_string()));

    let raw_segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.collect())
        .unwrap_or_default();

    for segment in raw_segments.iter().filter(|s| !s.is_empty()) {
        path.push(decode_segment(segment));
    }

    let is_file = raw_segments
        .last()
        .and_then(|last| path_extension(last))
        .is_some();
    if !is_file {
        path.push(INDEX_FILE);
    }

    path
}

/// Returns true if `url` names a page whose local copy is an implicit index
/// one directory below the URL's own directory
///
/// `/about` is stored as `about/index.html`, so relative links resolve
/// against `/` online but against `about/` offline.
pub fn is_extensionless_page(url: &Url) -> bool {
    url.path_segments()
        .and_then(|segments| segments.last())
        .map_or(false, |last| !last.is_empty() && path_extension(last).is_none())
}

/// Returns the file name a single download of `url` is saved under
///
/// This is the decoded last path segment, or `index.html` when the path
/// ends in `/` or the segment cannot be used as a file name.
pub fn remote_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .map(decode_segment)
        .unwrap_or_else(|| INDEX_FILE.to_string())
}

/// Percent-decodes one path segment for use as a file name
///
/// Segments that would decode to `.`, `..` or contain a path separator keep
/// their encoded form so they cannot escape their directory.
fn decode_segment(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(decoded)
            if decoded != "."
                && decoded != ".."
                && !decoded.contains('/')
                && !decoded.contains('\\')
                && !decoded.contains('\0') =>
        {
            decoded.into_owned()
        }
        _ => segment.to_string(),
    }
}
