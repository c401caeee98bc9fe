//! Data-plane primitives shared by downloads and the mirror
//!
//! A response body flows through the [`RateLimiter`] first and then into a
//! [`ProgressObserver`] wrapping the destination file, so the reported
//! throughput is the throttled rate.

mod progress;
mod rate_limit;

pub use progress::{format_bytes, ProgressMode, ProgressObserver, ProgressState, BAR_WIDTH, REPORT_INTERVAL};
pub use rate_limit::RateLimiter;
