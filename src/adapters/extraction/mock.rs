//! Static extractor for development and tests.

use async_trait::async_trait;

use crate::domain::catalog::DocumentKind;
use crate::domain::session::FieldMap;
use crate::ports::{normalize_schema, DocumentExtractor, ExtractionError};

/// Returns a preset field map for every upload, normalized against the
/// requested kind's schema.
pub struct StaticExtractor {
    fields: FieldMap,
}

impl StaticExtractor {
    pub fn new(fields: FieldMap) -> Self {
        Self { fields }
    }

    /// Shorthand for a one-field extractor.
    pub fn with_field(key: &str, value: &str) -> Self {
        let mut fields = FieldMap::new();
        fields.insert(key.to_string(), value.to_string());
        Self::new(fields)
    }
}

#[async_trait]
impl DocumentExtractor for StaticExtractor {
    async fn extract(
        &self,
        kind: DocumentKind,
        _file_name: &str,
        _bytes: Vec<u8>,
    ) -> Result<FieldMap, ExtractionError> {
        Ok(normalize_schema(kind, self.fields.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_preset_fields_with_full_schema() {
        let extractor = StaticExtractor::with_field("card_number", "11223344");
        let fields = extractor
            .extract(DocumentKind::Identity, "id.jpg", vec![1])
            .await
            .unwrap();

        assert_eq!(fields.get("card_number").map(String::as_str), Some("11223344"));
        assert_eq!(fields.get("name").map(String::as_str), Some(""));
    }
}
