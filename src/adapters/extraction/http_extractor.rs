//! HTTP client for the OCR extraction collaborator.
//!
//! Posts the uploaded file plus a kind-specific instruction to the
//! extraction service and normalizes the returned JSON object against the
//! kind's fixed schema, so downstream code can rely on every key being
//! present.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::catalog::DocumentKind;
use crate::domain::session::FieldMap;
use crate::ports::{normalize_schema, DocumentExtractor, ExtractionError};

/// Configuration for the extraction client.
#[derive(Debug, Clone)]
pub struct HttpExtractorConfig {
    /// Base URL of the extraction service.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl HttpExtractorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Extraction collaborator reached over HTTP.
pub struct HttpDocumentExtractor {
    config: HttpExtractorConfig,
    client: Client,
}

impl HttpDocumentExtractor {
    pub fn new(config: HttpExtractorConfig) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExtractionError::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn extract_url(&self) -> String {
        format!("{}/v1/extract", self.config.base_url)
    }
}

#[async_trait]
impl DocumentExtractor for HttpDocumentExtractor {
    async fn extract(
        &self,
        kind: DocumentKind,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<FieldMap, ExtractionError> {
        let form = Form::new()
            .text("kind", kind.to_string())
            .text("instruction", kind.extraction_instruction())
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()));

        let response = self
            .client
            .post(self.extract_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else {
                    ExtractionError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: BTreeMap<String, Value> = response
            .json()
            .await
            .map_err(|e| ExtractionError::Malformed(e.to_string()))?;

        let map = coerce_fields(body)?;
        Ok(normalize_schema(kind, map))
    }
}

/// Coerces the service's JSON values into the string-only field map.
///
/// Extraction backends occasionally return numbers for numeric fields;
/// anything structured is a contract violation.
fn coerce_fields(body: BTreeMap<String, Value>) -> Result<FieldMap, ExtractionError> {
    let mut map = FieldMap::new();
    for (key, value) in body {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Null => String::new(),
            other => {
                return Err(ExtractionError::Malformed(format!(
                    "field '{}' is not a string: {}",
                    key, other
                )))
            }
        };
        map.insert(key, text);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_accepts_strings_numbers_and_null() {
        let mut body = BTreeMap::new();
        body.insert("name".to_string(), Value::String("Fatima".to_string()));
        body.insert("year".to_string(), serde_json::json!(2020));
        body.insert("note".to_string(), Value::Null);

        let map = coerce_fields(body).unwrap();
        assert_eq!(map.get("name").map(String::as_str), Some("Fatima"));
        assert_eq!(map.get("year").map(String::as_str), Some("2020"));
        assert_eq!(map.get("note").map(String::as_str), Some(""));
    }

    #[test]
    fn coerce_rejects_nested_structures() {
        let mut body = BTreeMap::new();
        body.insert("nested".to_string(), serde_json::json!({"a": 1}));
        assert!(matches!(
            coerce_fields(body),
            Err(ExtractionError::Malformed(_))
        ));
    }

    #[test]
    fn extract_url_joins_base() {
        let extractor =
            HttpDocumentExtractor::new(HttpExtractorConfig::new("http://ocr:9090")).unwrap();
        assert_eq!(extractor.extract_url(), "http://ocr:9090/v1/extract");
    }
}
