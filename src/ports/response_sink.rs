//! Response Sink Port - write-once storage for completed answer sets.

use async_trait::async_trait;

use crate::domain::catalog::FlowId;
use crate::domain::session::AnswerMap;

/// Errors that can occur while persisting a completed answer set.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Remote store returned status {status}: {message}")]
    Upstream { status: u16, message: String },
}

/// Port for the persistence collaborator.
///
/// Called exactly once per successful flow completion, with the full
/// accumulated answer map, keyed by flow type.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    async fn persist(&self, flow: FlowId, answers: &AnswerMap) -> Result<(), PersistError>;
}
