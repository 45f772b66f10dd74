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
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Session TTL must be greater than zero")]
    InvalidSessionTtl,

    #[error("Session sweep interval must be greater than zero")]
    InvalidSweepInterval,

    #[error("Semantic API key must not be blank when set")]
    BlankSemanticApiKey,

    #[error("Invalid collaborator base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Upload size limit must be greater than zero")]
    InvalidUploadLimit,

    #[error("Responses directory must not be empty")]
    EmptyResponsesDir,
}
