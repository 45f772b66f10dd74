//! Completed answer set storage configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Storage configuration for the file response sink
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory completed answer sets are written to
    #[serde(default = "default_responses_dir")]
    pub responses_dir: String,
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.responses_dir.trim().is_empty() {
            return Err(ValidationError::EmptyResponsesDir);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            responses_dir: default_responses_dir(),
        }
    }
}

fn default_responses_dir() -> String {
    "./data/responses".to_string()
}
