//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Session secret must be at least {0} characters")]
    SessionSecretTooShort(usize),

    #[error("Session TTL must be greater than zero")]
    InvalidSessionTtl,

    #[error("Session cookie name must not be empty")]
    InvalidCookieName,

    #[error("Wizard base URL must start with '/'")]
    InvalidBaseUrl,
}
