//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `TaskState`: the states a crawl task moves through (queued, fetching, persisted, done, or one of the skip/failure states)
//! - `TaskLifecycle`: validated, forward-only transitions for one task

mod task_state;

// Re-export main types
pub use task_state::{TaskLifecycle, TaskState};
