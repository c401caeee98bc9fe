use crate::config::parser::parse_rate_limit;
use crate::config::types::{ClientConfig, Config, MirrorConfig, TransferConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_client_config(&config.client)?;
    validate_transfer_config(&config.transfer)?;
    validate_mirror_config(&config.mirror)?;
    Ok(())
}

/// Validates HTTP client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.max_redirects > 50 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be <= 50, got {}",
            config.max_redirects
        )));
    }

    Ok(())
}

/// Validates transfer configuration
fn validate_transfer_config(config: &TransferConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 || config.max_concurrent > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and 100, got {}",
            config.max_concurrent
        )));
    }

    if let Some(rate_limit) = &config.rate_limit {
        parse_rate_limit(rate_limit)?;
    }

    if let Some(directory) = &config.directory {
        if directory.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "directory cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates mirror configuration
fn validate_mirror_config(config: &MirrorConfig) -> Result<(), ConfigError> {
    for extension in &config.reject {
        if extension.contains('/') {
            return Err(ConfigError::Validation(format!(
                "reject entry '{}' must be a file extension, not a path",
                extension
            )));
        }
    }

    Ok(())
}
