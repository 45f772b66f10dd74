//! HTTP handlers for the chat endpoints.
//!
//! These handlers connect axum routes to application layer operations.
//! Validation rejections and collaborator hiccups inside the conversation
//! are already conversational replies by the time they get here; only
//! malformed requests and infrastructure failures surface as error codes.

use std::sync::Arc;

use axum::extract::{Json, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::{
    HandleMessageCommand, HandleMessageError, HandleMessageHandler, UploadDocumentCommand,
    UploadDocumentError, UploadDocumentHandler,
};
use crate::domain::session::FieldMap;

use super::dto::{ChatMessageRequest, ChatMessageResponse, ErrorBody};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state for chat handlers.
#[derive(Clone)]
pub struct ChatAppState {
    pub messages: Arc<HandleMessageHandler>,
    pub uploads: Arc<UploadDocumentHandler>,
}

impl ChatAppState {
    pub fn new(messages: Arc<HandleMessageHandler>, uploads: Arc<UploadDocumentHandler>) -> Self {
        Self { messages, uploads }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/chat/message
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/chat/message - process one chat message.
///
/// # Errors
/// - 400 Bad Request: empty user id
/// - 500 Internal Server Error: session store failure
pub async fn post_message(
    State(state): State<ChatAppState>,
    Json(request): Json<ChatMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reply = state
        .messages
        .handle(HandleMessageCommand {
            user_id: request.user_id,
            message: request.message,
        })
        .await
        .map_err(|err| match err {
            HandleMessageError::InvalidUserId(e) => ApiError::BadRequest(e.to_string()),
            HandleMessageError::Store(e) => ApiError::Internal(e.to_string()),
        })?;

    Ok((StatusCode::OK, Json(ChatMessageResponse::from(reply))))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/chat/upload
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/chat/upload - extract a field map from an uploaded document.
///
/// Multipart form with a `user_id` text field and a `file` part. Returns
/// the extracted field map; the caller echoes it back into the chat
/// endpoint as the next message.
///
/// # Errors
/// - 400 Bad Request: missing parts, or no document expected right now
/// - 413 Payload Too Large: upload exceeds the configured limit
/// - 502 Bad Gateway: extraction collaborator failure
pub async fn post_upload(
    State(state): State<ChatAppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (user_id, file_name, bytes) = read_upload_form(multipart).await?;

    let fields: FieldMap = state
        .uploads
        .handle(UploadDocumentCommand {
            user_id,
            file_name,
            bytes,
        })
        .await
        .map_err(|err| match err {
            UploadDocumentError::InvalidUserId(e) => ApiError::BadRequest(e.to_string()),
            UploadDocumentError::TooLarge { limit_bytes } => ApiError::PayloadTooLarge(format!(
                "Upload exceeds the {} byte limit",
                limit_bytes
            )),
            UploadDocumentError::NoDocumentExpected { question } => {
                ApiError::BadRequest(match question {
                    Some(question) => format!(
                        "No document is expected right now; the current question is: {}",
                        question
                    ),
                    None => "No document is expected right now".to_string(),
                })
            }
            UploadDocumentError::Store(e) => ApiError::Internal(e.to_string()),
            UploadDocumentError::Extraction(e) => {
                ApiError::UpstreamFailure(format!("Document extraction failed: {}", e))
            }
        })?;

    Ok((StatusCode::OK, Json(fields)))
}

/// Pulls `user_id` and `file` out of the multipart form.
async fn read_upload_form(
    mut multipart: Multipart,
) -> Result<(String, String, Vec<u8>), ApiError> {
    let mut user_id: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("user_id") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid user_id field: {}", e)))?;
                user_id = Some(value);
            }
            Some("file") => {
                let name = field
                    .file_name()
                    .unwrap_or("upload")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::PayloadTooLarge(format!("Could not read upload: {}", e)))?;
                file = Some((name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let user_id =
        user_id.ok_or_else(|| ApiError::BadRequest("Missing 'user_id' field".to_string()))?;
    let (file_name, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("Missing 'file' part".to_string()))?;
    Ok((user_id, file_name, bytes))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /health
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health - liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts handler errors to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    PayloadTooLarge(String),
    UpstreamFailure(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(msg)),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, ErrorBody::new(msg)),
            ApiError::UpstreamFailure(msg) => {
                tracing::warn!("upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, ErrorBody::new(msg))
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("An internal error occurred"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
