//! Concurrent download of a URL list
//!
//! Uses the same bounded task group as the mirror, without link following:
//! each URL holds one semaphore permit for the duration of its download.

use crate::download::single::{download_file, DownloadRequest};
use crate::output::BatchSummary;
use crate::transfer::ProgressMode;
use crate::url::parse_target_url;
use crate::{ConfigError, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Settings shared by every download of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Target directory for all files
    pub directory: Option<PathBuf>,

    /// Maximum number of downloads in flight
    pub max_concurrent: usize,

    /// Per-download rate limit in bytes per second, 0 for none
    pub rate_limit: u64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            directory: None,
            max_concurrent: 5,
            rate_limit: 0,
        }
    }
}

/// Reads a URL list, one URL per line
///
/// # Arguments
///
/// * `path` - The file to read
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Trimmed, non-blank lines in file order
/// * `Err(WgetError::Config)` - The file cannot be read or has no URLs
pub async fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path).await.map_err(ConfigError::Io)?;
    let urls = parse_url_list(&content);

    if urls.is_empty() {
        return Err(ConfigError::Validation(format!("No URLs found in input file '{}'", path.display())).into());
    }

    Ok(urls)
}

/// Splits URL list content into trimmed, non-blank lines
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Downloads every URL with bounded concurrency
///
/// Failures are reported per URL and never stop the batch. Cancellation
/// stops launching new downloads; in-flight ones unwind at their next
/// chunk boundary.
///
/// # Arguments
///
/// * `client` - The HTTP client shared by all downloads
/// * `urls` - The URLs to fetch
/// * `options` - Directory, concurrency and rate limit
/// * `cancel` - Stops the batch when triggered
///
/// # Returns
///
/// The number of successes out of the total, with each failure's message.
pub async fn download_batch(
    client: &Client,
    urls: &[String],
    options: &BatchOptions,
    cancel: &CancellationToken,
) -> BatchSummary {
    let mut summary = BatchSummary::new(urls.len());
    let budget = Arc::new(Semaphore::new(options.max_concurrent.max(1)));
    let mut downloads = JoinSet::new();

    println!(
        "Starting concurrent download of {} files with {} max concurrency...",
        urls.len(),
        options.max_concurrent
    );

    for raw in urls {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&budget).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        // Report finished downloads while the batch is still launching
        while let Some(joined) = downloads.try_join_next() {
            record_result(&mut summary, joined);
        }

        let raw = raw.clone();
        let client = client.clone();
        let cancel = cancel.clone();
        let mut request = match parse_target_url(&raw) {
            Ok(url) => DownloadRequest::new(url).with_rate_limit(options.rate_limit),
            Err(e) => {
                drop(permit);
                println!("Error downloading {}: {}", raw, e);
                summary.failures.push((raw, e.to_string()));
                continue;
            }
        };
        if let Some(dir) = &options.directory {
            request = request.with_directory(dir.clone());
        }

        downloads.spawn(async move {
            let result = download_file(&client, &request, ProgressMode::Terse, &cancel).await;
            drop(permit);
            (raw, result.map(|_| ()))
        });
    }

    while let Some(joined) = downloads.join_next().await {
        record_result(&mut summary, joined);
    }

    if cancel.is_cancelled() {
        println!("Concurrent download interrupted.");
        summary.interrupted = true;
    }

    summary
}

fn record_result(
    summary: &mut BatchSummary,
    joined: std::result::Result<(String, Result<()>), tokio::task::JoinError>,
) {
    match joined {
        Ok((url, Ok(()))) => {
            println!("Finished: {}", url);
            summary.succeeded += 1;
        }
        Ok((url, Err(e))) => {
            println!("Error downloading {}: {}", url, e);
            summary.failures.push((url, e.to_string()));
        }
        Err(e) => {
            tracing::error!("Download task panicked: {}", e);
            summary.failures.push((String::new(), e.to_string()));
        }
    }
}
