//! Semantic Validator Port - delegated free-text answer classification.

use async_trait::async_trait;

/// Verdict returned by the semantic collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticVerdict {
    Accept,
    Reject,
}

impl SemanticVerdict {
    /// Returns true if the answer was accepted.
    pub fn accepted(&self) -> bool {
        matches!(self, SemanticVerdict::Accept)
    }
}

/// Errors that can occur while consulting the semantic collaborator.
///
/// All of them are treated as a rejection by the caller; a failing
/// collaborator must never stall the conversation.
#[derive(Debug, thiserror::Error)]
pub enum SemanticError {
    #[error("Semantic check timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned status {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Provider response was not understood: {0}")]
    Malformed(String),
}

/// Port for the "is this input valid for this slot?" capability.
#[async_trait]
pub trait SemanticValidator: Send + Sync {
    /// Classifies a free-text answer against its question context.
    async fn validate(&self, question: &str, answer: &str)
        -> Result<SemanticVerdict, SemanticError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_accepted_flag() {
        assert!(SemanticVerdict::Accept.accepted());
        assert!(!SemanticVerdict::Reject.accepted());
    }

    #[test]
    fn timeout_error_reports_duration() {
        let err = SemanticError::Timeout { timeout_secs: 10 };
        assert!(err.to_string().contains("10s"));
    }
}
