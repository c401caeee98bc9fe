//! Single-file download
//!
//! One GET, streamed through the rate limiter and a progress observer into
//! the destination file. The interactive form prints the start and finish
//! timestamps around a live bar; the terse form prints one completion line.

use crate::crawler::fetch;
use crate::transfer::{format_bytes, ProgressMode, ProgressObserver, RateLimiter};
use crate::url::remote_file_name;
use crate::{Result, WgetError};
use chrono::{DateTime, Local};
use reqwest::Client;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::BufWriter;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What to download and where to put it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// The URL to fetch
    pub url: Url,

    /// File name override (`-O`)
    pub output_name: Option<String>,

    /// Target directory (`-P`), created if missing
    pub directory: Option<PathBuf>,

    /// Rate limit in bytes per second, 0 for none
    pub rate_limit: u64,
}

impl DownloadRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            output_name: None,
            directory: None,
            rate_limit: 0,
        }
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_rate_limit(mut self, bytes_per_sec: u64) -> Self {
        self.rate_limit = bytes_per_sec;
        self
    }

    /// The name of the file that will be written
    pub fn file_name(&self) -> String {
        match &self.output_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => remote_file_name(&self.url),
        }
    }

    /// The full path of the file that will be written
    pub fn destination(&self) -> PathBuf {
        match &self.directory {
            Some(dir) => dir.join(self.file_name()),
            None => PathBuf::from(self.file_name()),
        }
    }
}

/// Result of a completed download
#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub url: Url,
    pub path: PathBuf,
    pub bytes: u64,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

/// Downloads one URL to disk
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `request` - URL, file name, directory and rate limit
/// * `mode` - Live bar with status lines, or one terse completion line
/// * `cancel` - Checked between body chunks
///
/// # Returns
///
/// * `Ok(DownloadReport)` - The file was written completely
/// * `Err(WgetError)` - Network error, non-200 status, file error or
///   interruption. A partially written file is left in place.
pub async fn download_file(
    client: &Client,
    request: &DownloadRequest,
    mode: ProgressMode,
    cancel: &CancellationToken,
) -> Result<DownloadReport> {
    let interactive = mode == ProgressMode::Live;
    let started_at = Local::now();
    if interactive {
        println!("Starting download at {}", started_at.format(TIMESTAMP_FORMAT));
    }

    if cancel.is_cancelled() {
        return Err(WgetError::Interrupted);
    }

    let response = fetch(client, &request.url).await?;
    if interactive {
        println!("Response received: {}", response.status);
        if let Some(length) = response.content_length {
            println!("Content size: {}", format_bytes(length));
        }
    }

    if let Some(dir) = &request.directory {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| WgetError::persist(dir, e))?;
    }

    let path = request.destination();
    let file = fs::File::create(&path)
        .await
        .map_err(|e| WgetError::persist(&path, e))?;
    tracing::debug!("Writing {} to {}", request.url, path.display());

    let total = response.content_length;
    let mut observer = ProgressObserver::new(BufWriter::new(file), request.file_name(), total, mode);
    let limiter = RateLimiter::new(request.rate_limit);

    let bytes = match response.stream_into(&mut observer, limiter, cancel).await {
        Ok(bytes) => bytes,
        Err(e) => {
            observer.abandon();
            return Err(match e {
                WgetError::Io(source) => WgetError::persist(&path, source),
                other => other,
            });
        }
    };
    observer.finish();

    let finished_at = Local::now();
    if interactive {
        println!("Downloaded successfully: {}", request.url);
        println!("Finished at {}", finished_at.format(TIMESTAMP_FORMAT));
        println!("Total downloaded: {}", format_bytes(bytes));
    }

    Ok(DownloadReport {
        url: request.url.clone(),
        path,
        bytes,
        started_at,
        finished_at,
    })
}

/// Starts a download on a separate task and returns immediately
///
/// The task runs the same path as [`download_file`]; await the handle to
/// get its result.
pub fn spawn_download(
    client: Client,
    request: DownloadRequest,
    mode: ProgressMode,
    cancel: CancellationToken,
) -> JoinHandle<Result<DownloadReport>> {
    tokio::spawn(async move { download_file(&client, &request, mode, &cancel).await })
}
