//! Mock semantic validators for development and tests.

use async_trait::async_trait;

use crate::ports::{SemanticError, SemanticValidator, SemanticVerdict};

/// Accepts every answer. Used when no semantic collaborator is configured,
/// so development setups still move through flows.
pub struct AcceptAllValidator;

#[async_trait]
impl SemanticValidator for AcceptAllValidator {
    async fn validate(
        &self,
        _question: &str,
        _answer: &str,
    ) -> Result<SemanticVerdict, SemanticError> {
        Ok(SemanticVerdict::Accept)
    }
}

/// Rejects every answer. Test-only counterpart of [`AcceptAllValidator`].
pub struct RejectAllValidator;

#[async_trait]
impl SemanticValidator for RejectAllValidator {
    async fn validate(
        &self,
        _question: &str,
        _answer: &str,
    ) -> Result<SemanticVerdict, SemanticError> {
        Ok(SemanticVerdict::Reject)
    }
}
