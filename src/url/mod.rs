//! URL handling module for rwget
//!
//! This module provides target URL parsing, host scoping, reject/exclude
//! filtering, the mapping from remote URLs to local mirror paths, and the
//! classification of links discovered during a mirror.

mod domain;
mod filter;
mod local_path;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, same_host};
pub use filter::{should_reject, FilterRules};
pub use local_path::{
    is_extensionless_page, local_path, mirror_root, relative_local_path, remote_file_name,
    FALLBACK_ROOT, INDEX_FILE,
};
pub use normalize::{is_fetchable, normalize_url, parse_target_url};

use ::url::Url;

/// How a link discovered during a mirror is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkScope {
    /// Same host, accepted by the filter: fetched recursively
    Follow,
    /// Same host, but matched a reject or exclude rule
    Rejected,
    /// Different host: never fetched, left untouched by the rewriter
    OffHost,
    /// Not an http(s) URL
    Unsupported,
}

impl LinkScope {
    /// Returns true if the link should be fetched
    pub fn should_follow(&self) -> bool {
        matches!(self, Self::Follow)
    }
}

/// Classifies a discovered link relative to the mirror root
///
/// # Arguments
///
/// * `link` - The absolute link target
/// * `root` - The URL the mirror was started from
/// * `rules` - The reject and exclude rules for this run
///
/// # Returns
///
/// The scope of the link. Host scoping is checked before filtering so that
/// off-host links are reported as such even when they would also be rejected.
pub fn classify_link(link: &Url, root: &Url, rules: &FilterRules) -> LinkScope {
    if !is_fetchable(link) {
        return LinkScope::Unsupported;
    }

    if !same_host(link, root) {
        return LinkScope::OffHost;
    }

    if rules.should_reject(link.as_str()) {
        return LinkScope::Rejected;
    }

    LinkScope::Follow
}
