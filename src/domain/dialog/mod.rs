//! Dialog state machine - traversal, validation, and document merge.

mod document;
mod engine;
mod validator;

pub use document::{MergeOutcome, BACK_FOLLOW_UP, FRONT_FOLLOW_UP};
pub use engine::{Completion, DialogEngine, Evaluation, Turn};
pub use validator::{Deterministic, ValidationOutcome};
