//! Run statistics for mirrors and batch downloads
//!
//! This module provides the end-of-run summaries and their console output.

use crate::state::{TaskLifecycle, TaskState};
use std::fmt;
use std::path::PathBuf;

/// Mirror run summary
///
/// `visited` is the size of the visited set and `fetched` the number of
/// tasks that issued a request. Both count claims, so they are always equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    /// Directory holding the mirrored files
    pub root: PathBuf,

    /// URLs in the visited set at the end of the run
    pub visited: usize,

    /// Tasks that reached the fetching state
    pub fetched: usize,

    /// HTML documents rewritten and written
    pub documents: usize,

    /// Non-HTML files written as-is
    pub resources: usize,

    /// Tasks that failed after claiming their URL
    pub failed: usize,

    /// Tasks skipped for exceeding the maximum depth
    pub depth_skipped: usize,

    /// True if the run was cancelled
    pub interrupted: bool,
}

impl MirrorReport {
    /// Creates an empty report for a mirror root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Adds one finished task to the counters
    pub fn record(&mut self, lifecycle: &TaskLifecycle) {
        if lifecycle.reached(TaskState::Fetching) {
            self.fetched += 1;
        }
        if lifecycle.reached(TaskState::ExpandedPersisted) {
            self.documents += 1;
        }
        if lifecycle.reached(TaskState::LeafPersisted) {
            self.resources += 1;
        }

        match lifecycle.current() {
            TaskState::Failed => self.failed += 1,
            TaskState::DepthExceeded => self.depth_skipped += 1,
            TaskState::Interrupted => self.interrupted = true,
            _ => {}
        }
    }

    /// Number of files written
    pub fn persisted(&self) -> usize {
        self.documents + self.resources
    }
}

impl fmt::Display for MirrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.interrupted {
            writeln!(f, "Mirroring interrupted. Visited {} URLs.", self.visited)?;
        } else {
            writeln!(f, "Mirroring completed. Visited {} URLs.", self.visited)?;
        }
        writeln!(f, "  Saved to: {}", self.root.display())?;
        writeln!(f, "  Documents: {}", self.documents)?;
        writeln!(f, "  Resources: {}", self.resources)?;
        writeln!(f, "  Failed: {}", self.failed)?;
        write!(f, "  Skipped (max depth): {}", self.depth_skipped)
    }
}

/// Prints a mirror summary to stdout
pub fn print_mirror_report(report: &MirrorReport) {
    println!();
    println!("{}", report);
}

/// Batch download summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of URLs in the list
    pub total: usize,

    /// Downloads that completed
    pub succeeded: usize,

    /// URL and error message of each failed download
    pub failures: Vec<(String, String)>,

    /// True if the batch was cancelled
    pub interrupted: bool,
}

impl BatchSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Returns true if every URL was downloaded
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Download summary: {}/{} files downloaded successfully",
            self.succeeded, self.total
        )
    }
}

/// Prints a batch summary to stdout
pub fn print_batch_summary(summary: &BatchSummary) {
    println!();
    println!("{}", summary);
}
