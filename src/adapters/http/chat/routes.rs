//! Axum routes for the chat endpoints.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use super::handlers::{health, post_message, post_upload, ChatAppState};

/// Creates routes for chat endpoints.
///
/// REST Endpoints:
/// - POST /chat/message - process one chat message
/// - POST /chat/upload - extract a field map from an uploaded document
pub fn chat_routes() -> Router<ChatAppState> {
    Router::new()
        .route("/chat/message", post(post_message))
        .route("/chat/upload", post(post_upload))
}

/// Combined router with the chat routes under /api plus the health probe.
///
/// The body limit leaves headroom over the configured upload cap so the
/// size check in the upload handler, not the framework, is what rejects
/// oversized documents with a clear message.
pub fn api_router(state: ChatAppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .nest("/api", chat_routes())
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes + 64 * 1024))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_routes_creates_valid_router() {
        let _routes = chat_routes();
    }
}
