//! Document Extractor Port - OCR/vision text extraction collaborator.

use async_trait::async_trait;

use crate::domain::catalog::DocumentKind;
use crate::domain::session::FieldMap;

/// Errors that can occur during document extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Extraction timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Extractor returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Extractor response was not a field map: {0}")]
    Malformed(String),
}

/// Port for the black-box OCR collaborator.
///
/// Given file bytes and a document kind, returns the kind's fixed field
/// schema as a best-effort map. Implementations must normalize the result
/// so that every schema key is present - missing fields are empty strings,
/// never absent keys.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(
        &self,
        kind: DocumentKind,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<FieldMap, ExtractionError>;
}

/// Fills in any schema keys the extractor left out.
pub(crate) fn normalize_schema(kind: DocumentKind, mut map: FieldMap) -> FieldMap {
    for key in kind.schema_keys() {
        map.entry((*key).to_string()).or_default();
    }
    map
}
