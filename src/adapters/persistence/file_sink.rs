//! File-based response sink.
//!
//! Writes each completed answer set as a JSON file under a per-flow
//! directory. Write-once: every completion gets its own submission id.

use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::catalog::FlowId;
use crate::domain::foundation::{SubmissionId, Timestamp};
use crate::domain::session::AnswerMap;
use crate::ports::{PersistError, ResponseSink};

/// Persists completed answer sets to disk.
#[derive(Debug, Clone)]
pub struct FileResponseSink {
    base_dir: PathBuf,
}

impl FileResponseSink {
    /// Creates a sink rooted at `base_dir`. Directories are created lazily
    /// on the first write per flow.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn flow_dir(&self, flow: FlowId) -> PathBuf {
        self.base_dir.join(flow.to_string())
    }
}

#[async_trait]
impl ResponseSink for FileResponseSink {
    async fn persist(&self, flow: FlowId, answers: &AnswerMap) -> Result<(), PersistError> {
        let dir = self.flow_dir(flow);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| PersistError::Io(e.to_string()))?;

        let submission_id = SubmissionId::new();
        let payload = json!({
            "submission_id": submission_id,
            "flow": flow.to_string(),
            "submitted_at": Timestamp::now(),
            "responses": answers,
        });
        let body = serde_json::to_string_pretty(&payload)
            .map_err(|e| PersistError::Serialization(e.to_string()))?;

        let path = dir.join(format!("{}.json", submission_id));
        fs::write(&path, body)
            .await
            .map_err(|e| PersistError::Io(e.to_string()))?;

        tracing::info!(flow = %flow, path = %path.display(), "answer set persisted");
        Ok(())
    }
}
