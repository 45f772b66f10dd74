//! Catalog loading and load-time validation.
//!
//! The catalog is parsed from YAML once at startup and validated so that
//! broken branch wiring (an option pointing at a flow that does not exist,
//! a selector without options) fails fast instead of silently falling
//! through mid-conversation.

use serde::Deserialize;
use thiserror::Error;

use super::{AnswerRule, Flow, FlowId, QuestionNode, SlotPolicy};

/// Default flow definitions shipped with the binary.
const DEFAULT_CATALOG: &str = include_str!("defaults.yaml");

/// Errors raised while loading or validating the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Catalog does not define the '{0}' flow")]
    MissingFlow(FlowId),

    #[error("Flow '{0}' is defined more than once")]
    DuplicateFlow(FlowId),

    #[error("Flow '{0}' has no questions")]
    EmptyFlow(FlowId),

    #[error("Flow '{flow}' repeats the question '{question}'")]
    DuplicateQuestion { flow: FlowId, question: String },

    #[error("Flow '{flow}': question '{question}' uses option matching but has no options")]
    OptionsRequired { flow: FlowId, question: String },

    #[error("Flow '{flow}': branch answer '{answer}' targets undefined flow '{target}'")]
    UnknownBranchTarget {
        flow: FlowId,
        answer: String,
        target: FlowId,
    },

    #[error("Flow '{flow}': rule answer '{answer}' is not one of the question's options")]
    RuleAnswerNotAnOption { flow: FlowId, answer: String },
}

/// The loaded, validated question catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    flows: Vec<Flow>,
}

impl Catalog {
    /// Parses a catalog from YAML and validates it.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Loads the default catalog embedded in the binary.
    pub fn load_default() -> Result<Self, CatalogError> {
        Self::from_yaml(DEFAULT_CATALOG)
    }

    /// Looks up a flow by id.
    pub fn flow(&self, id: FlowId) -> Option<&Flow> {
        self.flows.iter().find(|f| f.id == id)
    }

    /// The entry flow every new session starts in.
    ///
    /// Guaranteed present by [`Catalog::validate`].
    pub fn initial_flow(&self) -> &Flow {
        self.flow(FlowId::Initial)
            .expect("catalog validation guarantees an initial flow")
    }

    /// All defined flows.
    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.flow(FlowId::Initial).is_none() {
            return Err(CatalogError::MissingFlow(FlowId::Initial));
        }

        for flow in &self.flows {
            if self.flows.iter().filter(|f| f.id == flow.id).count() > 1 {
                return Err(CatalogError::DuplicateFlow(flow.id));
            }
            if flow.is_empty() {
                return Err(CatalogError::EmptyFlow(flow.id));
            }

            let mut seen: Vec<&str> = Vec::new();
            for node in &flow.nodes {
                self.validate_node(flow.id, node, &mut seen)?;
            }
        }
        Ok(())
    }

    /// Validates one node and, recursively, the follow-ups it can splice in.
    ///
    /// `seen` accumulates every question identity reachable in the flow,
    /// spliced follow-ups included, because they share one key space.
    fn validate_node<'a>(
        &self,
        flow_id: FlowId,
        node: &'a QuestionNode,
        seen: &mut Vec<&'a str>,
    ) -> Result<(), CatalogError> {
        if seen.contains(&node.identity()) {
            return Err(CatalogError::DuplicateQuestion {
                flow: flow_id,
                question: node.identity().to_string(),
            });
        }
        seen.push(node.identity());

        if node.policy == SlotPolicy::AnyOf && !node.has_options() {
            return Err(CatalogError::OptionsRequired {
                flow: flow_id,
                question: node.identity().to_string(),
            });
        }

        for rule in &node.on_answer {
            match rule {
                AnswerRule::SwitchFlow { answer, target } => {
                    if self.flow(*target).is_none() {
                        return Err(CatalogError::UnknownBranchTarget {
                            flow: flow_id,
                            answer: answer.clone(),
                            target: *target,
                        });
                    }
                    if node.has_options() && !node.options.iter().any(|o| o == answer) {
                        return Err(CatalogError::RuleAnswerNotAnOption {
                            flow: flow_id,
                            answer: answer.clone(),
                        });
                    }
                }
                AnswerRule::InsertFollowUps { answer, nodes } => {
                    if node.has_options() && !node.options.iter().any(|o| o == answer) {
                        return Err(CatalogError::RuleAnswerNotAnOption {
                            flow: flow_id,
                            answer: answer.clone(),
                        });
                    }
                    for follow_up in nodes {
                        self.validate_node(flow_id, follow_up, seen)?;
                    }
                }
            }
        }
        Ok(())
    }
}
