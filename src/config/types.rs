use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for rwget
///
/// Every section is optional in the TOML file; missing keys fall back to the
/// defaults below and command-line flags are applied on top.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub transfer: TransferConfig,
    pub mirror: MirrorConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// TCP connect timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Maximum number of redirects followed per request
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("rwget/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout_secs: 10,
            max_redirects: 10,
        }
    }
}

/// Settings shared by single, batch and mirror transfers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Directory downloads are written into
    pub directory: Option<PathBuf>,

    /// Throughput ceiling such as "200k" or "2M"; unset means unlimited
    #[serde(rename = "rate-limit")]
    pub rate_limit: Option<String>,

    /// Maximum number of concurrent fetches for batch and mirror runs
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            directory: None,
            rate_limit: None,
            max_concurrent: 5,
        }
    }
}

/// Mirror-specific configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Maximum link depth followed from the root URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// File extensions that are never fetched (without the leading dot)
    pub reject: Vec<String>,

    /// Path substrings that are never fetched
    pub exclude: Vec<String>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            reject: Vec::new(),
            exclude: Vec::new(),
        }
    }
}
