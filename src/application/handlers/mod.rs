//! Use-case handlers.

mod handle_message;
mod upload_document;

pub use handle_message::{ChatReply, HandleMessageCommand, HandleMessageError, HandleMessageHandler};
pub use upload_document::{UploadDocumentCommand, UploadDocumentError, UploadDocumentHandler};
