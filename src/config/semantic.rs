//! Semantic validation collaborator configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Semantic validator configuration
///
/// Without an API key the service falls back to accepting free-text
/// answers as-is, which keeps development setups running.
#[derive(Debug, Clone, Deserialize)]
pub struct SemanticConfig {
    /// Anthropic API key; optional
    pub api_key: Option<String>,

    /// Model used for classification
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL for the API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SemanticConfig {
    /// Get the timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if a collaborator is configured
    pub fn is_configured(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Validate semantic configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(key) = &self.api_key {
            if key.trim().is_empty() {
                return Err(ValidationError::BlankSemanticApiKey);
            }
        }
        if !self.base_url.starts_with("http") {
            return Err(ValidationError::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(())
    }
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}
