//! UploadDocumentHandler - extract a field map from an uploaded file.
//!
//! The upload endpoint is a companion to the chat endpoint: it runs the OCR
//! collaborator against the file and returns the extracted field map, which
//! the caller echoes back into the chat as a JSON-encoded message. The
//! document kind comes from the question the user's session is currently
//! waiting on.

use std::sync::Arc;

use crate::domain::catalog::{DocumentKind, SlotPolicy};
use crate::domain::foundation::{UserId, ValidationError};
use crate::domain::session::FieldMap;
use crate::ports::{DocumentExtractor, ExtractionError, SessionStore, SessionStoreError};

/// Command to extract fields from one uploaded file.
#[derive(Debug, Clone)]
pub struct UploadDocumentCommand {
    pub user_id: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Errors surfaced to the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum UploadDocumentError {
    #[error("Invalid user id: {0}")]
    InvalidUserId(#[from] ValidationError),

    #[error("Upload exceeds the {limit_bytes} byte limit")]
    TooLarge { limit_bytes: usize },

    #[error("No document is expected at this point in the conversation")]
    NoDocumentExpected {
        /// The question actually awaiting an answer, if any.
        question: Option<String>,
    },

    #[error(transparent)]
    Store(#[from] SessionStoreError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Handler for the document upload endpoint.
pub struct UploadDocumentHandler {
    store: Arc<dyn SessionStore>,
    extractor: Arc<dyn DocumentExtractor>,
    max_upload_bytes: usize,
}

impl UploadDocumentHandler {
    pub fn new(
        store: Arc<dyn SessionStore>,
        extractor: Arc<dyn DocumentExtractor>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            store,
            extractor,
            max_upload_bytes,
        }
    }

    pub async fn handle(&self, cmd: UploadDocumentCommand) -> Result<FieldMap, UploadDocumentError> {
        if cmd.bytes.len() > self.max_upload_bytes {
            return Err(UploadDocumentError::TooLarge {
                limit_bytes: self.max_upload_bytes,
            });
        }

        let user_id = UserId::new(&cmd.user_id)?;
        let kind = self.expected_document_kind(&user_id).await?;

        tracing::debug!(
            user = %user_id,
            kind = %kind,
            file = %cmd.file_name,
            size = cmd.bytes.len(),
            "extracting document"
        );
        let fields = self
            .extractor
            .extract(kind, &cmd.file_name, cmd.bytes)
            .await?;
        Ok(fields)
    }

    /// Reads which document kind the session is waiting on.
    ///
    /// The lock is released before the extraction call; the upload never
    /// mutates the session, so holding it across a slow OCR round trip
    /// would only stall the user's chat for no benefit.
    async fn expected_document_kind(
        &self,
        user_id: &UserId,
    ) -> Result<DocumentKind, UploadDocumentError> {
        let session_ref = self.store.get_or_create(user_id).await?;
        let session = session_ref.lock().await;

        match session.current_node().map(|n| (n.policy, n.identity().to_string())) {
            Some((SlotPolicy::Document(kind), _)) if session.welcome_shown() => Ok(kind),
            Some((_, question)) => Err(UploadDocumentError::NoDocumentExpected {
                question: session.welcome_shown().then_some(question),
            }),
            None => Err(UploadDocumentError::NoDocumentExpected { question: None }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::extraction::StaticExtractor;
    use crate::adapters::session::InMemorySessionStore;
    use crate::domain::catalog::Catalog;

    const DOC_FIRST: &str = r#"
flows:
  - id: initial
    nodes:
      - question: "Please upload the front and back sides of your Emirates ID."
        policy:
          document: identity
      - question: "What is your mobile number?"
        policy:
          format: phone
"#;

    fn handler_with(yaml: &str, extractor: Arc<dyn DocumentExtractor>) -> (UploadDocumentHandler, Arc<InMemorySessionStore>) {
        let catalog = Arc::new(Catalog::from_yaml(yaml).unwrap());
        let store = Arc::new(InMemorySessionStore::new(catalog));
        (
            UploadDocumentHandler::new(store.clone(), extractor, 1024),
            store,
        )
    }

    fn upload(bytes: Vec<u8>) -> UploadDocumentCommand {
        UploadDocumentCommand {
            user_id: "user-1".to_string(),
            file_name: "id.jpg".to_string(),
            bytes,
        }
    }

    async fn enter_flow(store: &InMemorySessionStore) {
        let session_ref = store
            .get_or_create(&UserId::new("user-1").unwrap())
            .await
            .unwrap();
        session_ref.lock().await.mark_welcome_shown();
    }

    #[tokio::test]
    async fn extracts_kind_from_current_question() {
        let extractor = Arc::new(StaticExtractor::with_field("name", "Fatima Hassan"));
        let (handler, store) = handler_with(DOC_FIRST, extractor);
        enter_flow(&store).await;

        let fields = handler.handle(upload(vec![1, 2, 3])).await.unwrap();
        assert_eq!(fields.get("name").map(String::as_str), Some("Fatima Hassan"));
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_before_extraction() {
        let extractor = Arc::new(StaticExtractor::with_field("name", "x"));
        let (handler, store) = handler_with(DOC_FIRST, extractor);
        enter_flow(&store).await;

        let err = handler.handle(upload(vec![0; 2048])).await.unwrap_err();
        assert!(matches!(err, UploadDocumentError::TooLarge { limit_bytes: 1024 }));
    }

    #[tokio::test]
    async fn upload_before_welcome_is_refused() {
        let extractor = Arc::new(StaticExtractor::with_field("name", "x"));
        let (handler, _) = handler_with(DOC_FIRST, extractor);

        let err = handler.handle(upload(vec![1])).await.unwrap_err();
        assert!(matches!(
            err,
            UploadDocumentError::NoDocumentExpected { question: None }
        ));
    }

    #[tokio::test]
    async fn upload_at_text_question_is_refused_with_the_question() {
        let yaml = r#"
flows:
  - id: initial
    nodes:
      - question: "What is your mobile number?"
        policy:
          format: phone
"#;
        let extractor = Arc::new(StaticExtractor::with_field("name", "x"));
        let (handler, store) = handler_with(yaml, extractor);
        enter_flow(&store).await;

        let err = handler.handle(upload(vec![1])).await.unwrap_err();
        match err {
            UploadDocumentError::NoDocumentExpected { question } => {
                assert_eq!(question.as_deref(), Some("What is your mobile number?"));
            }
            other => panic!("expected NoDocumentExpected, got {:?}", other),
        }
    }
}
