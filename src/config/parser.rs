use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Rate limit grammar: a decimal number with an optional `k`/`m` suffix
#[allow(clippy::expect_used)]
static RATE_LIMIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+(?:\.[0-9]+)?)([kKmM])?$").expect("rate limit regex is valid"));

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use rwget::config::load_config;
///
/// let config = load_config(Path::new("rwget.toml")).unwrap();
/// println!("Max depth: {}", config.mirror.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Parses a rate limit string such as "200k" or "2M" into bytes per second
///
/// A bare number is bytes per second, `k`/`K` multiplies by 1024 and
/// `m`/`M` by 1024². An empty string means no limit and yields 0, as does
/// an explicit "0".
///
/// # Examples
///
/// ```
/// use rwget::parse_rate_limit;
///
/// assert_eq!(parse_rate_limit("200k").unwrap(), 200 * 1024);
/// assert_eq!(parse_rate_limit("1.5M").unwrap(), 1_572_864);
/// assert_eq!(parse_rate_limit("").unwrap(), 0);
/// assert!(parse_rate_limit("fast").is_err());
/// ```
pub fn parse_rate_limit(input: &str) -> Result<u64, ConfigError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(0);
    }

    let invalid = || ConfigError::InvalidRateLimit(input.to_string());
    let captures = RATE_LIMIT_PATTERN.captures(input).ok_or_else(invalid)?;

    let value: f64 = captures[1].parse().map_err(|_| invalid())?;
    let multiplier = match captures.get(2).map(|m| m.as_str()) {
        Some("k" | "K") => 1024.0,
        Some("m" | "M") => 1024.0 * 1024.0,
        _ => 1.0,
    };

    Ok((value * multiplier) as u64)
}
