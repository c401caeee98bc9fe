//! Output module for end-of-run summaries
//!
//! This module handles:
//! - Tallying mirror task outcomes into a report
//! - Batch download success counts
//! - Printing both to stdout

pub mod stats;

pub use stats::{print_batch_summary, print_mirror_report, BatchSummary, MirrorReport};
