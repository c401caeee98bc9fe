//! Crawler module for recursive site mirroring
//!
//! This module contains the core mirroring logic, including:
//! - HTTP fetching with strict status validation
//! - HTML link extraction and link rewriting
//! - Bounded-concurrency scheduling with a shared visited set
//! - Overall mirror coordination

mod coordinator;
mod fetcher;
mod parser;
mod rewriter;
mod scheduler;

pub use coordinator::{run_mirror, Coordinator, MirrorOptions, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_DEPTH};
pub use fetcher::{build_http_client, fetch, is_html_content_type, FetchResponse};
pub use parser::{extract_links, resolve_link, LINK_ATTRIBUTES};
pub use rewriter::{relative_href, rewrite_document};
pub use scheduler::{CrawlTask, Scheduler, SchedulerOutcome, TaskReport, VisitedSet};

use crate::config::Config;
use crate::output::MirrorReport;
use crate::{Result, WgetError};
use tokio_util::sync::CancellationToken;

/// Runs a complete mirror operation from a configuration
///
/// This is the configuration-driven entry point. It will:
/// 1. Parse and validate the root URL
/// 2. Build the HTTP client from the `[client]` section
/// 3. Derive mirror options from the `[mirror]` and `[transfer]` sections
/// 4. Run the mirror until every reachable page is processed or the run is cancelled
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `url` - The root URL to mirror
/// * `cancel` - Cancels the run when triggered
///
/// # Returns
///
/// * `Ok(MirrorReport)` - Mirror completed or was interrupted
/// * `Err(WgetError)` - Invalid URL, invalid options, or the mirror root could not be created
pub async fn mirror(config: &Config, url: &str, cancel: CancellationToken) -> Result<MirrorReport> {
    let root_url = crate::url::parse_target_url(url)?;
    let options = MirrorOptions::from_config(config)?;
    let client = build_http_client(&config.client).map_err(|source| WgetError::Http {
        url: root_url.to_string(),
        source,
    })?;

    run_mirror(client, root_url, options, cancel).await
}
