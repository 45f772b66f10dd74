//! Request/response DTOs for the chat endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::ChatReply;

/// POST /api/chat/message request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessageRequest {
    pub user_id: String,
    pub message: String,
}

/// POST /api/chat/message response body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageResponse {
    /// Conversational reply text.
    pub response: String,

    /// Fixed options for the current question, pipe-separated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,

    /// The question now awaiting an answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    /// The accumulated answer map, present only on flow completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_responses: Option<serde_json::Value>,
}

impl From<ChatReply> for ChatMessageResponse {
    fn from(reply: ChatReply) -> Self {
        Self {
            response: reply.response,
            options: reply.options.map(|options| options.join(" | ")),
            question: reply.question,
            final_responses: reply
                .final_responses
                .and_then(|answers| serde_json::to_value(answers).ok()),
        }
    }
}

/// Error body returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
