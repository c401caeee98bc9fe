//! Mirror coordinator - main mirror orchestration logic
//!
//! This module ties the crawl together:
//! - Creating the mirror root
//! - Running each task through its lifecycle (skip checks, claim, fetch)
//! - Expanding HTML documents into accepted child links
//! - Rewriting and persisting documents, persisting other files as-is
//! - Tallying the final report

use crate::config::{parse_rate_limit, Config};
use crate::crawler::fetcher::{fetch, FetchResponse};
use crate::crawler::parser::extract_links;
use crate::crawler::rewriter::rewrite_document;
use crate::crawler::scheduler::{CrawlTask, Scheduler, TaskReport, VisitedSet};
use crate::output::MirrorReport;
use crate::state::{TaskLifecycle, TaskState};
use crate::transfer::{ProgressMode, ProgressObserver, RateLimiter};
use crate::url::{classify_link, local_path, mirror_root, FilterRules, LinkScope};
use crate::{ConfigResult, Result, WgetError};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Default maximum link depth
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// Default number of concurrent fetches
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Settings for one mirror run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorOptions {
    /// File extensions never fetched
    pub reject: Vec<String>,

    /// Path substrings never fetched
    pub exclude: Vec<String>,

    /// Deepest link distance from the root that is still fetched
    pub max_depth: u32,

    /// Maximum number of fetches in flight
    pub max_concurrent: usize,

    /// Per-transfer rate limit in bytes per second, 0 for none
    pub rate_limit: u64,

    /// Directory that receives the mirror root, current directory if unset
    pub output_dir: Option<PathBuf>,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            reject: Vec::new(),
            exclude: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            rate_limit: 0,
            output_dir: None,
        }
    }
}

impl MirrorOptions {
    /// Builds options from the `[mirror]` and `[transfer]` sections
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let rate_limit = match &config.transfer.rate_limit {
            Some(spec) => parse_rate_limit(spec)?,
            None => 0,
        };

        Ok(Self {
            reject: config.mirror.reject.clone(),
            exclude: config.mirror.exclude.clone(),
            max_depth: config.mirror.max_depth,
            max_concurrent: config.transfer.max_concurrent,
            rate_limit,
            output_dir: config.transfer.directory.clone(),
        })
    }
}

/// Main mirror coordinator structure
pub struct Coordinator {
    root_url: Url,
    options: MirrorOptions,
    worker: MirrorWorker,
}

/// Everything one task needs; cloned into every spawned worker
#[derive(Clone)]
struct MirrorWorker {
    client: Client,
    rules: Arc<FilterRules>,
    mirror_root: Arc<PathBuf>,
    visited: Arc<VisitedSet>,
    max_depth: u32,
    rate_limit: u64,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `client` - The HTTP client shared by all workers
    /// * `root_url` - The URL to start from; its host scopes the crawl
    /// * `options` - Filters, limits and output directory
    /// * `cancel` - Cancels the whole run when triggered
    pub fn new(client: Client, root_url: Url, options: MirrorOptions, cancel: CancellationToken) -> Self {
        let root_dir = mirror_root(&root_url, options.output_dir.as_deref());
        let worker = MirrorWorker {
            client,
            rules: Arc::new(FilterRules::new(&options.reject, &options.exclude)),
            mirror_root: Arc::new(root_dir),
            visited: Arc::new(VisitedSet::new()),
            max_depth: options.max_depth,
            rate_limit: options.rate_limit,
            cancel,
        };

        Self {
            root_url,
            options,
            worker,
        }
    }

    /// Directory that receives every mirrored file
    pub fn mirror_root(&self) -> &Path {
        &self.worker.mirror_root
    }

    pub fn options(&self) -> &MirrorOptions {
        &self.options
    }

    /// The run's visited set
    pub fn visited(&self) -> &VisitedSet {
        &self.worker.visited
    }

    /// Runs the mirror to completion
    ///
    /// # Returns
    ///
    /// * `Ok(MirrorReport)` - The run finished or was cancelled
    /// * `Err(WgetError::Persist)` - The mirror root could not be created
    pub async fn run(&self) -> Result<MirrorReport> {
        let root_dir = self.mirror_root().to_path_buf();
        fs::create_dir_all(&root_dir)
            .await
            .map_err(|e| WgetError::persist(&root_dir, e))?;

        tracing::info!(
            "Mirroring {} into {} (max depth {}, {} concurrent)",
            self.root_url,
            root_dir.display(),
            self.options.max_depth,
            self.options.max_concurrent
        );

        let mut scheduler = Scheduler::new(self.options.max_concurrent, self.worker.cancel.clone());
        scheduler.enqueue(CrawlTask::root(self.root_url.clone()));

        let worker = self.worker.clone();
        let outcome = scheduler
            .run(move |task| {
                let worker = worker.clone();
                async move { worker.process(task).await }
            })
            .await;

        let mut report = MirrorReport::new(root_dir);
        for task in &outcome.reports {
            report.record(&task.lifecycle);
        }
        report.failed += outcome.panicked;
        report.visited = self.worker.visited.len();
        report.interrupted |= outcome.abandoned > 0 || self.worker.cancel.is_cancelled();

        tracing::info!(
            "Mirror finished: {} visited, {} documents, {} resources, {} failed",
            report.visited,
            report.documents,
            report.resources,
            report.failed
        );

        Ok(report)
    }
}

impl MirrorWorker {
    /// Processes a single task and reports its outcome
    async fn process(self, task: CrawlTask) -> TaskReport {
        let mut lifecycle = TaskLifecycle::new();
        match self.visit(&task, &mut lifecycle).await {
            Ok(children) => TaskReport {
                url: task.url,
                depth: task.depth,
                lifecycle,
                children,
            },
            Err(e) => {
                tracing::error!("Task for {} ended in an invalid state: {}", task.url, e);
                TaskReport::leaf(&task, lifecycle)
            }
        }
    }

    /// Runs the terminal checks in order, then claims and fetches
    ///
    /// Only lifecycle violations surface as errors; fetch and persist
    /// failures end the task in the `Failed` state.
    async fn visit(&self, task: &CrawlTask, lifecycle: &mut TaskLifecycle) -> Result<Vec<CrawlTask>> {
        if self.cancel.is_cancelled() {
            lifecycle.advance(TaskState::Interrupted)?;
            return Ok(Vec::new());
        }

        if task.depth > self.max_depth {
            tracing::info!(
                "Skipping {}: max depth ({}) reached",
                task.url,
                self.max_depth
            );
            lifecycle.advance(TaskState::DepthExceeded)?;
            return Ok(Vec::new());
        }

        if !self.visited.claim(&task.url) {
            tracing::trace!("Already visited: {}", task.url);
            lifecycle.advance(TaskState::AlreadyVisited)?;
            return Ok(Vec::new());
        }

        lifecycle.advance(TaskState::Fetching)?;
        tracing::info!("Mirroring: {} (depth {})", task.url, task.depth);

        match self.fetch_and_persist(task, lifecycle).await {
            Ok(children) => Ok(children),
            Err(e @ WgetError::InvalidTransition { .. }) => Err(e),
            Err(e) if e.is_interrupted() => {
                tracing::debug!("Interrupted while mirroring {}", task.url);
                lifecycle.advance(TaskState::Interrupted)?;
                Ok(Vec::new())
            }
            Err(e) => {
                if e.is_not_found() {
                    tracing::warn!("404 Not Found: {}", task.url);
                } else {
                    tracing::warn!("Error mirroring {}: {}", task.url, e);
                }
                lifecycle.advance(TaskState::Failed)?;
                Ok(Vec::new())
            }
        }
    }

    async fn fetch_and_persist(&self, task: &CrawlTask, lifecycle: &mut TaskLifecycle) -> Result<Vec<CrawlTask>> {
        let response = fetch(&self.client, &task.url).await?;
        let path = local_path(&task.url, &self.mirror_root);
        let limiter = RateLimiter::new(self.rate_limit);

        if response.is_html() {
            let body = response.read_to_end(limiter, &self.cancel).await?;
            let children = self.persist_document(task, &body, &path).await?;

            lifecycle.advance(TaskState::ExpandedPersisted)?;
            lifecycle.advance(TaskState::Done)?;
            Ok(children)
        } else {
            self.stream_to_file(response, &path, limiter).await?;

            lifecycle.advance(TaskState::LeafPersisted)?;
            lifecycle.advance(TaskState::Done)?;
            Ok(Vec::new())
        }
    }

    /// Expands, rewrites and writes one fetched HTML document
    ///
    /// Cancellation is checked again after expansion, so an interrupted
    /// task never touches the file system.
    async fn persist_document(&self, task: &CrawlTask, body: &[u8], path: &Path) -> Result<Vec<CrawlTask>> {
        let children = self.accept_children(task, body);

        let document = match rewrite_document(body, &task.url, &task.base_url) {
            Ok(rewritten) => rewritten,
            Err(e) => {
                tracing::warn!("Keeping original HTML for {}: {}", task.url, e);
                body.to_vec()
            }
        };

        if self.cancel.is_cancelled() {
            return Err(WgetError::Interrupted);
        }

        write_file(path, &document).await?;
        Ok(children)
    }

    /// Extracts links and keeps the ones this run should fetch
    fn accept_children(&self, task: &CrawlTask, body: &[u8]) -> Vec<CrawlTask> {
        let html = String::from_utf8_lossy(body);
        let mut children = Vec::new();

        for link in extract_links(&html, &task.url) {
            if self.cancel.is_cancelled() {
                break;
            }

            let scope = classify_link(&link, &task.base_url, &self.rules);
            if scope != LinkScope::Follow {
                tracing::debug!("Not following {}: {:?}", link, scope);
                continue;
            }

            if self.visited.contains(&link) {
                continue;
            }

            children.push(task.child(link));
        }

        tracing::debug!("{}: {} links accepted", task.url, children.len());
        children
    }

    async fn stream_to_file(&self, response: FetchResponse, path: &Path, limiter: RateLimiter) -> Result<()> {
        create_parent_dir(path).await?;
        let file = fs::File::create(path)
            .await
            .map_err(|e| WgetError::persist(path, e))?;

        let total = response.content_length;
        let mut observer = ProgressObserver::new(BufWriter::new(file), display_name(path), total, ProgressMode::Terse);
        match response.stream_into(&mut observer, limiter, &self.cancel).await {
            Ok(_) => {
                observer.finish();
                Ok(())
            }
            Err(WgetError::Io(e)) => Err(WgetError::persist(path, e)),
            Err(e) => Err(e),
        }
    }
}

async fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| WgetError::persist(parent, e))?;
    }
    Ok(())
}

/// Writes a whole document, announcing it like a streamed resource
async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    create_parent_dir(path).await?;
    let file = fs::File::create(path)
        .await
        .map_err(|e| WgetError::persist(path, e))?;

    let mut observer = ProgressObserver::new(
        BufWriter::new(file),
        display_name(path),
        Some(bytes.len() as u64),
        ProgressMode::Terse,
    );
    let written = async {
        observer.write_all(bytes).await?;
        observer.flush().await
    };
    written.await.map_err(|e| WgetError::persist(path, e))?;
    observer.finish();
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Runs a complete mirror operation
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `root_url` - The URL to mirror
/// * `options` - Filters, limits and output directory
/// * `cancel` - Cancels the run when triggered
///
/// # Returns
///
/// * `Ok(MirrorReport)` - Mirror completed or was interrupted
/// * `Err(WgetError)` - The mirror root could not be created
///
/// # Example
///
/// ```no_run
/// use rwget::config::ClientConfig;
/// use rwget::crawler::{build_http_client, run_mirror, MirrorOptions};
/// use tokio_util::sync::CancellationToken;
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = build_http_client(&ClientConfig::default())?;
/// let url = Url::parse("https://example.com/")?;
/// let report = run_mirror(client, url, MirrorOptions::default(), CancellationToken::new()).await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
pub async fn run_mirror(
    client: Client,
    root_url: Url,
    options: MirrorOptions,
    cancel: CancellationToken,
) -> Result<MirrorReport> {
    let coordinator = Coordinator::new(client, root_url, options, cancel);
    coordinator.run().await
}
