//! In-memory response sink for tests and development.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::catalog::FlowId;
use crate::domain::session::AnswerMap;
use crate::ports::{PersistError, ResponseSink};

/// Records every persisted answer set in memory.
#[derive(Default)]
pub struct InMemoryResponseSink {
    writes: Mutex<Vec<(FlowId, AnswerMap)>>,
}

impl InMemoryResponseSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes seen so far, in order.
    pub async fn writes(&self) -> Vec<(FlowId, AnswerMap)> {
        self.writes.lock().await.clone()
    }
}

#[async_trait]
impl ResponseSink for InMemoryResponseSink {
    async fn persist(&self, flow: FlowId, answers: &AnswerMap) -> Result<(), PersistError> {
        self.writes.lock().await.push((flow, answers.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::AnswerValue;

    #[tokio::test]
    async fn records_writes_in_order() {
        let sink = InMemoryResponseSink::new();
        let mut answers = AnswerMap::new();
        answers.insert("q", AnswerValue::text("a"));

        sink.persist(FlowId::Claim, &answers).await.unwrap();
        sink.persist(FlowId::Medical, &answers).await.unwrap();

        let writes = sink.writes().await;
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].0, FlowId::Claim);
        assert_eq!(writes[1].0, FlowId::Medical);
    }
}
