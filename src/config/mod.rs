//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `COVERBOT` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use coverbot::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod error;
mod extraction;
mod semantic;
mod server;
mod session;
mod storage;

pub use error::{ConfigError, ValidationError};
pub use extraction::ExtractionConfig;
pub use semantic::SemanticConfig;
pub use server::{Environment, ServerConfig};
pub use session::SessionConfig;
pub use storage::StorageConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has working defaults, so a bare development start needs no
/// environment at all; production deployments override via `COVERBOT__*`
/// variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Session lifetime configuration (TTL, sweep interval)
    #[serde(default)]
    pub session: SessionConfig,

    /// Semantic validation collaborator configuration
    #[serde(default)]
    pub semantic: SemanticConfig,

    /// Document extraction collaborator configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Completed answer set storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `COVERBOT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `COVERBOT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `COVERBOT__SESSION__TTL_SECS=1800` -> `session.ttl_secs = 1800`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("COVERBOT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.session.validate()?;
        self.semantic.validate()?;
        self.extraction.validate()?;
        self.storage.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
