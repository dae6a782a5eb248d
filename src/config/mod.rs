//! Configuration management for livedoc
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use livedoc::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `LIVEDOC__<section>__<key>`
//!
//! Examples:
//! - `LIVEDOC__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `LIVEDOC__CONTENT__BASE_URL=https://api.example.com`
//! - `LIVEDOC__SERVER__API__MAX_PAYLOAD_BYTES=10MB`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/livedoc.toml`.
//! This can be overridden using the `LIVEDOC_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{ApiLimits, Config, ContentConfig, LoggingConfig, ServerConfig};
pub use validation::{MAX_PAYLOAD_LIMIT, ValidationError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a value
    /// fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
