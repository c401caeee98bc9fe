//! Configuration module for rwget
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and parsing rate-limit strings.
//!
//! # Example
//!
//! ```no_run
//! use rwget::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("rwget.toml")).unwrap();
//! println!("Mirror will use max depth: {}", config.mirror.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ClientConfig, Config, MirrorConfig, TransferConfig};

// Re-export parser functions
pub use parser::{load_config, parse_rate_limit};
pub use validation::validate;
