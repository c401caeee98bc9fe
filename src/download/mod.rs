//! Download module for non-recursive fetches
//!
//! - `single`: one URL to one file, interactive or on a background task
//! - `batch`: a URL list with bounded concurrency and a success summary

mod batch;
mod single;

pub use batch::{download_batch, parse_url_list, read_url_list, BatchOptions};
pub use single::{download_file, spawn_download, DownloadReport, DownloadRequest};
