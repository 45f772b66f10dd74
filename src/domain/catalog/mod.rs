//! Question catalog - static flow definitions loaded at startup.
//!
//! Flows are ordered sequences of question nodes. Each node carries an
//! explicit validation policy and optional branch/splice rules, so runtime
//! dispatch is a lookup on the node rather than string comparison against
//! question text.

mod flow;
mod loader;
mod node;

pub use flow::{CompletionPolicy, Flow, FlowId};
pub use loader::{Catalog, CatalogError};
pub use node::{AnswerRule, DocumentKind, FormatRule, QuestionNode, SlotPolicy};
