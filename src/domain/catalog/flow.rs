//! Flows - named, ordered sequences of question nodes.

use serde::{Deserialize, Serialize};

use super::QuestionNode;

/// Identifies one conversational path through the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowId {
    /// Entry flow every new session starts in.
    Initial,
    Medical,
    Motor,
    Car,
    Bike,
    Claim,
}

impl std::fmt::Display for FlowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FlowId::Initial => "initial",
            FlowId::Medical => "medical",
            FlowId::Motor => "motor",
            FlowId::Car => "car",
            FlowId::Bike => "bike",
            FlowId::Claim => "claim",
        };
        write!(f, "{}", s)
    }
}

/// What happens to the session once a flow completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Drop the session immediately after persisting the answers.
    Discard,
    /// Keep the session so follow-up actions (e.g. a generated document
    /// link) can still reference it.
    #[default]
    Retain,
}

/// One named question flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: FlowId,
    pub nodes: Vec<QuestionNode>,

    #[serde(default)]
    pub completion: CompletionPolicy,

    /// Message sent when the last question has been answered.
    #[serde(default = "default_completion_message")]
    pub completion_message: String,
}

impl Flow {
    /// The first question of this flow, if it has any nodes.
    pub fn first_node(&self) -> Option<&QuestionNode> {
        self.nodes.first()
    }

    /// Number of catalog nodes in this flow.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the flow has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn default_completion_message() -> String {
    "Thank you! We have everything we need.".to_string()
}
