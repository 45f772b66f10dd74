//! LLM-backed semantic validator.
//!
//! Asks a Claude model whether a free-text answer plausibly satisfies the
//! question it was given, expecting a bare YES/NO verdict. Any failure is
//! reported as an error; the caller treats errors as rejections, so a
//! misbehaving model can slow the conversation down but never stall it.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{SemanticError, SemanticValidator, SemanticVerdict};

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = "You review a single answer given in an insurance intake chat. \
     Reply with exactly YES if the answer is a plausible, relevant response to the question, \
     or exactly NO if it is not. Reply with nothing else.";

/// Configuration for the LLM validator.
#[derive(Debug, Clone)]
pub struct LlmValidatorConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl LlmValidatorConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-3-5-haiku-20241022".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Semantic validator backed by Anthropic's messages API.
pub struct LlmSemanticValidator {
    config: LlmValidatorConfig,
    client: Client,
}

impl LlmSemanticValidator {
    /// Creates a new validator with the given configuration.
    pub fn new(config: LlmValidatorConfig) -> Result<Self, SemanticError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SemanticError::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    fn parse_verdict(&self, text: &str) -> Result<SemanticVerdict, SemanticError> {
        let normalized = text.trim().to_ascii_uppercase();
        if normalized.starts_with("YES") {
            Ok(SemanticVerdict::Accept)
        } else if normalized.starts_with("NO") {
            Ok(SemanticVerdict::Reject)
        } else {
            Err(SemanticError::Malformed(format!(
                "expected YES or NO, got '{}'",
                text.trim()
            )))
        }
    }
}

#[async_trait]
impl SemanticValidator for LlmSemanticValidator {
    async fn validate(
        &self,
        question: &str,
        answer: &str,
    ) -> Result<SemanticVerdict, SemanticError> {
        let request = ClassificationRequest {
            model: self.config.model.clone(),
            max_tokens: 8,
            system: SYSTEM_PROMPT.to_string(),
            messages: vec![ClassificationMessage {
                role: "user".to_string(),
                content: format!("Question: {}\nAnswer: {}", question, answer),
            }],
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SemanticError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else {
                    SemanticError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SemanticError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: ClassificationResponse = response
            .json()
            .await
            .map_err(|e| SemanticError::Malformed(e.to_string()))?;

        let text = body
            .content
            .first()
            .map(|block| block.text.as_str())
            .ok_or_else(|| SemanticError::Malformed("empty content".to_string()))?;

        self.parse_verdict(text)
    }
}

#[derive(Debug, Serialize)]
struct ClassificationRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<ClassificationMessage>,
}

#[derive(Debug, Serialize)]
struct ClassificationMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClassificationResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: String,
}
