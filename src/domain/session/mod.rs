//! Per-user conversation state.

mod answer;
mod session;

pub use answer::{AnswerMap, AnswerValue, FieldMap};
pub use session::{ConversationPhase, DocumentSides, Session};
