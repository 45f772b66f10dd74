//! Chat endpoints - message processing and document upload.

mod dto;
mod handlers;
mod routes;

pub use dto::{ChatMessageRequest, ChatMessageResponse, ErrorBody};
pub use handlers::{ApiError, ChatAppState};
pub use routes::{api_router, chat_routes};
