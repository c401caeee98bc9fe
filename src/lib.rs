//! rwget: a wget-style downloader and site mirror
//!
//! This crate fetches files over HTTP(S) with optional throttling and live
//! progress, downloads URL lists concurrently, and mirrors a site by
//! recursively following same-host links and rewriting them so the local
//! copy can be browsed offline.

pub mod config;
pub mod crawler;
pub mod download;
pub mod output;
pub mod state;
pub mod transfer;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for rwget operations
#[derive(Debug, Error)]
pub enum WgetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Request failed for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("HTML rewrite error for {url}: {message}")]
    HtmlRewrite { url: String, message: String },

    #[error("Failed to write '{}': {source}", path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download interrupted")]
    Interrupted,

    #[error("Invalid task state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::TaskState,
        to: state::TaskState,
    },
}

impl WgetError {
    /// Returns true for an HTTP 404 response
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == reqwest::StatusCode::NOT_FOUND)
    }

    /// Returns true if the error was caused by cooperative cancellation
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }

    pub(crate) fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid rate limit format: {0}")]
    InvalidRateLimit(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for rwget operations
pub type Result<T> = std::result::Result<T, WgetError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{parse_rate_limit, Config};
pub use crawler::{run_mirror, Coordinator, MirrorOptions};
pub use download::{download_batch, download_file, spawn_download, DownloadRequest};
pub use output::{BatchSummary, MirrorReport};
pub use state::TaskState;
pub use transfer::{ProgressMode, RateLimiter};
pub use self::url::{local_path, should_reject, FilterRules};
