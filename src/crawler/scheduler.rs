//! Scheduler for bounded, recursive crawl fan-out
//!
//! This module handles:
//! - The unit of crawl work (`CrawlTask`)
//! - The run-wide dedup ledger (`VisitedSet`)
//! - Global concurrency limiting via a semaphore, one permit per in-flight task
//! - Queueing children handed back by finished workers
//! - Joining every worker before the run completes

use crate::state::{TaskLifecycle, TaskState};
use crate::url::normalize_url;
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A URL accepted for crawling
///
/// Created when a link is accepted and consumed exactly once by a worker.
#[derive(Debug, Clone)]
pub struct CrawlTask {
    /// The URL to fetch
    pub url: Url,

    /// The root URL of the mirror
    pub base_url: Arc<Url>,

    /// Link distance from the root
    pub depth: u32,
}

impl CrawlTask {
    /// Creates the depth-0 task for a mirror root
    pub fn root(url: Url) -> Self {
        let base_url = Arc::new(url.clone());
        Self {
            url,
            base_url,
            depth: 0,
        }
    }

    /// Creates a task for a link found on this task's page
    pub fn child(&self, url: Url) -> Self {
        Self {
            url,
            base_url: Arc::clone(&self.base_url),
            depth: self.depth + 1,
        }
    }
}

/// The set of URLs already claimed for fetching in one run
///
/// Keys are absolute URLs without fragment. [`VisitedSet::claim`] is the
/// only authoritative check: membership test and insertion happen under one
/// lock, so two workers discovering the same URL can never both fetch it.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `url` as visited; returns false if it already was
    pub fn claim(&self, url: &Url) -> bool {
        let key = visited_key(url);
        match self.urls.lock() {
            Ok(mut urls) => urls.insert(key),
            Err(poisoned) => poisoned.into_inner().insert(key),
        }
    }

    /// Returns true if `url` has been claimed
    ///
    /// The answer may be stale by the time the caller acts on it; use it
    /// only to avoid queueing obvious duplicates.
    pub fn contains(&self, url: &Url) -> bool {
        let key = visited_key(url);
        match self.urls.lock() {
            Ok(urls) => urls.contains(&key),
            Err(poisoned) => poisoned.into_inner().contains(&key),
        }
    }

    pub fn len(&self) -> usize {
        match self.urls.lock() {
            Ok(urls) => urls.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn visited_key(url: &Url) -> String {
    normalize_url(url.clone()).into()
}

/// What a worker hands back to the scheduler
#[derive(Debug)]
pub struct TaskReport {
    /// The task's URL
    pub url: Url,

    /// The task's depth
    pub depth: u32,

    /// Every state the task went through
    pub lifecycle: TaskLifecycle,

    /// Accepted links to crawl next
    pub children: Vec<CrawlTask>,
}

impl TaskReport {
    /// Creates a report for a task that produced no children
    pub fn leaf(task: &CrawlTask, lifecycle: TaskLifecycle) -> Self {
        Self {
            url: task.url.clone(),
            depth: task.depth,
            lifecycle,
            children: Vec::new(),
        }
    }

    /// The task's final state
    pub fn state(&self) -> TaskState {
        self.lifecycle.current()
    }
}

/// Summary of one scheduler run
#[derive(Debug, Default)]
pub struct SchedulerOutcome {
    /// Reports of every joined worker
    pub reports: Vec<TaskReport>,

    /// Tasks still queued when cancellation stopped the run
    pub abandoned: usize,

    /// Workers that panicked
    pub panicked: usize,
}

/// Scheduler runs crawl tasks with bounded concurrency
///
/// Each in-flight task holds exactly one owned permit while it fetches and
/// persists. Children found by a task are returned with its report and
/// queued; they start as permits free up. A task never waits for a permit
/// while holding one.
pub struct Scheduler {
    /// Global semaphore for limiting concurrent tasks
    budget: Arc<Semaphore>,

    /// Accepted tasks waiting for a permit
    pending: VecDeque<CrawlTask>,

    /// Running tasks
    workers: JoinSet<TaskReport>,

    cancel: CancellationToken,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `max_concurrent` - Maximum number of tasks in flight, at least 1
    /// * `cancel` - Stops launching queued tasks once cancelled
    pub fn new(max_concurrent: usize, cancel: CancellationToken) -> Self {
        Self {
            budget: Arc::new(Semaphore::new(max_concurrent.max(1))),
            pending: VecDeque::new(),
            workers: JoinSet::new(),
            cancel,
        }
    }

    /// Queues a task
    pub fn enqueue(&mut self, task: CrawlTask) {
        self.pending.push_back(task);
    }

    /// Number of tasks waiting for a permit
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of tasks currently running
    pub fn in_flight(&self) -> usize {
        self.workers.len()
    }

    /// Runs queued tasks and their descendants until none remain
    ///
    /// # Arguments
    ///
    /// * `worker` - Builds the future that processes one task
    ///
    /// # Returns
    ///
    /// The reports of all tasks, plus the number of tasks abandoned after
    /// cancellation and the number of workers that panicked.
    pub async fn run<F, Fut>(mut self, mut worker: F) -> SchedulerOutcome
    where
        F: FnMut(CrawlTask) -> Fut,
        Fut: Future<Output = TaskReport> + Send + 'static,
    {
        let mut outcome = SchedulerOutcome::default();

        loop {
            self.launch_ready(&mut worker);

            let Some(joined) = self.workers.join_next().await else {
                break;
            };

            match joined {
                Ok(mut report) => {
                    let children = std::mem::take(&mut report.children);
                    tracing::trace!(
                        "{} finished as {} with {} children",
                        report.url,
                        report.state(),
                        children.len()
                    );
                    self.pending.extend(children);
                    outcome.reports.push(report);
                }
                Err(e) => {
                    tracing::error!("Crawl worker panicked: {}", e);
                    outcome.panicked += 1;
                }
            }
        }

        outcome.abandoned = self.pending.len();
        if outcome.abandoned > 0 {
            tracing::debug!("{} queued tasks abandoned after cancellation", outcome.abandoned);
        }
        outcome
    }

    /// Starts queued tasks while permits are available
    fn launch_ready<F, Fut>(&mut self, worker: &mut F)
    where
        F: FnMut(CrawlTask) -> Fut,
        Fut: Future<Output = TaskReport> + Send + 'static,
    {
        while !self.cancel.is_cancelled() {
            let Some(task) = self.pending.pop_front() else {
                break;
            };

            let permit = match Arc::clone(&self.budget).try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    self.pending.push_front(task);
                    break;
                }
            };

            tracing::trace!("Launching {} (depth {})", task.url, task.depth);
            let future = worker(task);
            self.workers.spawn(async move {
                let report = future.await;
                drop(permit);
                report
            });
        }
    }
}
