//! Lifecycle states of one crawl task
//!
//! A task moves forward only: it never revisits an earlier state.

use crate::{Result, WgetError};
use std::fmt;

/// Represents the current state of a crawl task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    // ===== Active States =====
    /// Task was accepted and is waiting for a concurrency slot
    Queued,

    /// Task claimed its URL and the request is in flight
    Fetching,

    /// Non-HTML body was written as-is
    LeafPersisted,

    /// HTML document was expanded, rewritten and written
    ExpandedPersisted,

    // ===== Terminal States =====
    /// Task finished successfully
    Done,

    /// Task was deeper than the configured maximum and never fetched
    DepthExceeded,

    /// URL was already claimed by another task
    AlreadyVisited,

    /// Cancellation was requested before or during the task
    Interrupted,

    /// Fetch or persist failed; the URL is not retried in this run
    Failed,
}

impl TaskState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Done | Self::DepthExceeded | Self::AlreadyVisited | Self::Interrupted | Self::Failed
        )
    }

    /// Returns true if the task wrote a file
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::LeafPersisted | Self::ExpandedPersisted)
    }

    /// Returns true if the task was skipped without a request
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::DepthExceeded | Self::AlreadyVisited)
    }

    /// Returns true if moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        use TaskState::*;

        match self {
            Queued => matches!(next, Fetching | DepthExceeded | AlreadyVisited | Interrupted),
            Fetching => matches!(next, LeafPersisted | ExpandedPersisted | Failed | Interrupted),
            LeafPersisted | ExpandedPersisted => next == Done,
            Done | DepthExceeded | AlreadyVisited | Interrupted | Failed => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::LeafPersisted => "leaf_persisted",
            Self::ExpandedPersisted => "expanded_persisted",
            Self::Done => "done",
            Self::DepthExceeded => "depth_exceeded",
            Self::AlreadyVisited => "already_visited",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible task states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Queued,
            Self::Fetching,
            Self::LeafPersisted,
            Self::ExpandedPersisted,
            Self::Done,
            Self::DepthExceeded,
            Self::AlreadyVisited,
            Self::Interrupted,
            Self::Failed,
        ]
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks the state history of one task and validates every transition
#[derive(Debug, Clone)]
pub struct TaskLifecycle {
    history: Vec<TaskState>,
}

impl TaskLifecycle {
    /// Starts a lifecycle in the `Queued` state
    pub fn new() -> Self {
        Self {
            history: vec![TaskState::Queued],
        }
    }

    pub fn current(&self) -> TaskState {
        // history is never empty
        self.history.last().copied().unwrap_or(TaskState::Queued)
    }

    /// Moves to `next`, or fails with `WgetError::InvalidTransition`
    pub fn advance(&mut self, next: TaskState) -> Result<()> {
        let from = self.current();
        if !from.can_transition_to(next) {
            return Err(WgetError::InvalidTransition { from, to: next });
        }
        self.history.push(next);
        Ok(())
    }

    /// Returns true if the task ever was in `state`
    pub fn reached(&self, state: TaskState) -> bool {
        self.history.contains(&state)
    }

    pub fn history(&self) -> &[TaskState] {
        &self.history
    }
}

impl Default for TaskLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
