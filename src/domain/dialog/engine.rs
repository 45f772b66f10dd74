//! Dialog engine - the state machine driving question traversal.
//!
//! One engine serves every session; all conversation state lives in the
//! [`Session`]. Each turn resolves the node at the cursor, validates the
//! message against it, applies branch/splice rules, and assembles the next
//! prompt. Semantic checks are asynchronous collaborator calls, so the
//! engine surfaces them to the application layer instead of blocking.

use std::sync::Arc;

use crate::domain::catalog::{
    AnswerRule, Catalog, CompletionPolicy, FlowId, QuestionNode, SlotPolicy,
};
use crate::domain::session::{AnswerMap, AnswerValue, ConversationPhase, Session};

use super::document::{self, MergeOutcome, BACK_FOLLOW_UP, FRONT_FOLLOW_UP};
use super::validator::{self, Deterministic, ValidationOutcome};

/// One-time greeting prefixed to the first question.
const WELCOME: &str = "Welcome! I can help you purchase insurance or file a claim.";

/// Generic fallback when the semantic collaborator rejects or fails.
const FALLBACK: &str = "Sorry, I didn't quite get that. Let's try again.";

/// Everything the chat endpoint needs to answer one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// Conversational reply text.
    pub response: String,
    /// The question now awaiting an answer, if any.
    pub question: Option<String>,
    /// Fixed options for that question, if it has them.
    pub options: Option<Vec<String>>,
    /// Present exactly when this turn completed the flow.
    pub completion: Option<Completion>,
}

/// Emitted once per flow completion; carries the final answer set.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub flow: FlowId,
    pub policy: CompletionPolicy,
    pub answers: AnswerMap,
}

/// Result of the synchronous evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// The turn was fully resolved by deterministic rules.
    Resolved(Turn),
    /// The current slot needs the semantic collaborator's verdict; call
    /// [`DialogEngine::resolve_semantic`] with the result.
    NeedsSemantic { question: String },
}

/// The flow controller.
pub struct DialogEngine {
    catalog: Arc<Catalog>,
}

impl DialogEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Sends the one-time greeting and the first question.
    ///
    /// The triggering message itself is not consumed as an answer.
    pub fn welcome(&self, session: &mut Session) -> Turn {
        session.mark_welcome_shown();
        let mut turn = self.serve(session, "");
        turn.response = format!("{} {}", WELCOME, turn.response);
        turn
    }

    /// Evaluates one user message against the current question.
    pub fn evaluate(&self, session: &mut Session, message: &str) -> Evaluation {
        session.touch();

        if session.phase() == ConversationPhase::Complete {
            if !session.is_persisted() {
                // A previous persistence attempt failed; re-emit the
                // completion so the caller can retry the write.
                return Evaluation::Resolved(self.finish(session));
            }
            return Evaluation::Resolved(self.already_complete(session));
        }

        let Some(node) = session.current_node().cloned() else {
            // Cursor already at the terminal position; close the flow out.
            return Evaluation::Resolved(self.finish(session));
        };

        if let SlotPolicy::Document(kind) = node.policy {
            return Evaluation::Resolved(self.apply_document(session, &node, kind, message));
        }

        match validator::check(&node, message) {
            Deterministic::NeedsSemantic => Evaluation::NeedsSemantic {
                question: node.identity().to_string(),
            },
            Deterministic::Outcome(outcome) => {
                Evaluation::Resolved(self.apply(session, &node, outcome))
            }
        }
    }

    /// Applies the semantic collaborator's verdict for the current slot.
    ///
    /// A rejection (or a collaborator failure mapped to one) produces the
    /// generic fallback response; the conversation never goes silent.
    pub fn resolve_semantic(&self, session: &mut Session, message: &str, accepted: bool) -> Turn {
        let Some(node) = session.current_node().cloned() else {
            return self.finish(session);
        };

        if accepted {
            self.apply(
                session,
                &node,
                ValidationOutcome::Accepted(AnswerValue::text(message.trim())),
            )
        } else {
            Turn {
                response: format!("{} {}", FALLBACK, node.identity()),
                question: Some(node.identity().to_string()),
                options: None,
                completion: None,
            }
        }
    }

    fn apply(&self, session: &mut Session, node: &QuestionNode, outcome: ValidationOutcome) -> Turn {
        match outcome {
            ValidationOutcome::Rejected { retry_prompt } => Turn {
                response: retry_prompt,
                question: Some(node.identity().to_string()),
                options: node.has_options().then(|| node.options.clone()),
                completion: None,
            },
            ValidationOutcome::AcceptedWithBranch(target) => {
                let flow = self
                    .catalog
                    .flow(target)
                    .expect("catalog validation guarantees branch targets");
                session.switch_flow(target, flow.nodes.clone());
                tracing::debug!(user = %session.user_id(), flow = %target, "flow switch");
                self.serve(session, "Great choice. ")
            }
            ValidationOutcome::Accepted(value) => {
                let answer_text = value.as_text().map(str::to_string);
                session.record_answer(node.identity(), value);
                self.apply_splice_rules(session, node, answer_text.as_deref());
                session.advance();
                self.serve(session, "Got it. ")
            }
        }
    }

    /// Applies the node's insert rules against the accepted answer.
    ///
    /// Runs before the cursor moves, so a matching rule's follow-ups become
    /// the very next questions. Rules that do not match have their nodes
    /// removed, which un-splices follow-ups when the user changes a gating
    /// answer.
    fn apply_splice_rules(&self, session: &mut Session, node: &QuestionNode, answer: Option<&str>) {
        for rule in &node.on_answer {
            if let AnswerRule::InsertFollowUps { answer: trigger, nodes } = rule {
                if answer == Some(trigger.as_str()) {
                    session.insert_follow_ups(nodes);
                } else {
                    session.remove_follow_ups(nodes.iter().map(|n| n.identity()));
                }
            }
        }
    }

    fn apply_document(
        &self,
        session: &mut Session,
        node: &QuestionNode,
        kind: crate::domain::catalog::DocumentKind,
        raw: &str,
    ) -> Turn {
        match document::merge(session, kind, raw) {
            MergeOutcome::Malformed { prompt } | MergeOutcome::Unreadable { prompt } => Turn {
                response: prompt,
                question: Some(node.identity().to_string()),
                options: None,
                completion: None,
            },
            MergeOutcome::AwaitingSide { follow_up } => {
                session.insert_follow_ups(std::slice::from_ref(&follow_up));
                session.mark_pending(node.identity());
                Turn {
                    response: follow_up.identity().to_string(),
                    question: Some(follow_up.identity().to_string()),
                    options: None,
                    completion: None,
                }
            }
            MergeOutcome::Complete { fields } => {
                session.remove_follow_ups([FRONT_FOLLOW_UP, BACK_FOLLOW_UP]);
                session.record_answer(node.identity(), AnswerValue::Document(fields));
                session.advance();
                self.serve(session, "Document received. ")
            }
        }
    }

    /// Serves the question at the cursor, or closes the flow if the cursor
    /// has reached the terminal position.
    fn serve(&self, session: &mut Session, prefix: &str) -> Turn {
        match session.current_node() {
            Some(node) => Turn {
                response: format!("{}{}", prefix, node.identity()),
                question: Some(node.identity().to_string()),
                options: node.has_options().then(|| node.options.clone()),
                completion: None,
            },
            None => self.finish(session),
        }
    }

    fn finish(&self, session: &mut Session) -> Turn {
        session.complete();
        let (message, policy) = match self.catalog.flow(session.flow()) {
            Some(flow) => (flow.completion_message.clone(), flow.completion),
            None => (
                "Thank you! We have everything we need.".to_string(),
                CompletionPolicy::Retain,
            ),
        };
        tracing::info!(
            user = %session.user_id(),
            flow = %session.flow(),
            answers = session.answers().len(),
            "flow complete"
        );
        Turn {
            response: message,
            question: None,
            options: None,
            completion: Some(Completion {
                flow: session.flow(),
                policy,
                answers: session.answers().clone(),
            }),
        }
    }

    fn already_complete(&self, session: &Session) -> Turn {
        Turn {
            response: format!(
                "Your {} request is already complete. Thank you for choosing us!",
                session.flow()
            ),
            question: None,
            options: None,
            completion: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    fn engine_with(yaml: &str) -> (DialogEngine, Session) {
        let catalog = Arc::new(Catalog::from_yaml(yaml).unwrap());
        let session = Session::new(
            UserId::new("user-1").unwrap(),
            FlowId::Initial,
            catalog.initial_flow().nodes.clone(),
        );
        (DialogEngine::new(catalog), session)
    }

    fn default_engine() -> (DialogEngine, Session) {
        let catalog = Arc::new(Catalog::load_default().unwrap());
        let session = Session::new(
            UserId::new("user-1").unwrap(),
            FlowId::Initial,
            catalog.initial_flow().nodes.clone(),
        );
        (DialogEngine::new(catalog), session)
    }

    fn resolved(evaluation: Evaluation) -> Turn {
        match evaluation {
            Evaluation::Resolved(turn) => turn,
            other => panic!("expected resolved turn, got {:?}", other),
        }
    }

    const GATE_CATALOG: &str = r#"
flows:
  - id: initial
    completion: retain
    completion_message: "All done."
    nodes:
      - question: "Are you suffering from any pre-existing or chronic conditions?"
        options: ["Yes", "No"]
        policy: any_of
        on_answer:
          - insert_follow_ups:
              answer: "Yes"
              nodes:
                - question: "Please upload your latest medical report."
                  policy:
                    document: medical_report
      - question: "Anything else?"
        policy: accept
"#;

    #[test]
    fn first_message_greets_and_asks_first_question() {
        let (engine, mut session) = default_engine();
        let turn = engine.welcome(&mut session);

        assert!(turn.response.starts_with(WELCOME));
        assert!(turn.response.contains("What would you like to do today?"));
        assert!(session.welcome_shown());
        assert_eq!(session.phase(), ConversationPhase::InFlow);
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn selecting_branch_option_switches_flow_and_resets_cursor() {
        let (engine, mut session) = default_engine();
        engine.welcome(&mut session);

        let turn = resolved(engine.evaluate(&mut session, "Purchase a Motor Insurance"));

        assert_eq!(session.flow(), FlowId::Motor);
        assert_eq!(session.cursor(), 0);
        assert!(turn
            .response
            .contains("Which type of vehicle would you like to insure?"));
        assert_eq!(
            turn.options,
            Some(vec!["Car".to_string(), "Bike".to_string()])
        );
    }

    #[test]
    fn rejected_answer_mutates_nothing_and_lists_options() {
        let (engine, mut session) = default_engine();
        engine.welcome(&mut session);

        let turn = resolved(engine.evaluate(&mut session, "Buy a yacht"));

        assert_eq!(session.cursor(), 0);
        assert!(session.answers().is_empty());
        assert_eq!(session.flow(), FlowId::Initial);
        assert!(turn.response.contains("Purchase a Medical Insurance"));
        assert!(turn.response.contains("Purchase a Motor Insurance"));
        assert!(turn.response.contains("File a Claim"));
        assert!(turn.completion.is_none());
    }

    #[test]
    fn yes_gate_splices_follow_up_immediately_next() {
        let (engine, mut session) = engine_with(GATE_CATALOG);
        engine.welcome(&mut session);

        let turn = resolved(engine.evaluate(&mut session, "Yes"));

        assert_eq!(
            turn.question.as_deref(),
            Some("Please upload your latest medical report.")
        );
        assert_eq!(
            session.node_identities(),
            vec![
                "Are you suffering from any pre-existing or chronic conditions?",
                "Please upload your latest medical report.",
                "Anything else?",
            ]
        );
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn no_gate_skips_straight_to_next_catalog_question() {
        let (engine, mut session) = engine_with(GATE_CATALOG);
        engine.welcome(&mut session);

        let turn = resolved(engine.evaluate(&mut session, "No"));

        assert_eq!(turn.question.as_deref(), Some("Anything else?"));
        assert_eq!(session.node_count(), 2);
    }

    #[test]
    fn completing_last_question_emits_final_answers() {
        let yaml = r#"
flows:
  - id: initial
    completion: discard
    completion_message: "Claim registered."
    nodes:
      - question: "Describe it."
        policy: accept
"#;
        let (engine, mut session) = engine_with(yaml);
        engine.welcome(&mut session);

        let turn = resolved(engine.evaluate(&mut session, "Rear bumper damage"));

        assert_eq!(turn.response, "Claim registered.");
        let completion = turn.completion.expect("completion expected");
        assert_eq!(completion.policy, CompletionPolicy::Discard);
        assert_eq!(
            completion.answers.get("Describe it."),
            Some(&AnswerValue::text("Rear bumper damage"))
        );
        assert_eq!(session.phase(), ConversationPhase::Complete);

        // Until the answer set is persisted, completion is re-emitted so the
        // caller can retry the write.
        let retry = resolved(engine.evaluate(&mut session, "hello?"));
        assert!(retry.completion.is_some());

        // Once persisted, later messages no longer re-emit it.
        session.mark_persisted();
        let again = resolved(engine.evaluate(&mut session, "hello?"));
        assert!(again.completion.is_none());
    }

    #[test]
    fn semantic_slot_defers_then_accepts() {
        let yaml = r#"
flows:
  - id: initial
    nodes:
      - question: "May I have your full name, please?"
        policy: semantic
      - question: "Anything else?"
        policy: accept
"#;
        let (engine, mut session) = engine_with(yaml);
        engine.welcome(&mut session);

        let evaluation = engine.evaluate(&mut session, "Fatima Hassan");
        assert_eq!(
            evaluation,
            Evaluation::NeedsSemantic {
                question: "May I have your full name, please?".to_string()
            }
        );

        let turn = engine.resolve_semantic(&mut session, "Fatima Hassan", true);
        assert_eq!(turn.question.as_deref(), Some("Anything else?"));
        assert_eq!(
            session.answers().get("May I have your full name, please?"),
            Some(&AnswerValue::text("Fatima Hassan"))
        );
    }

    #[test]
    fn semantic_rejection_falls_back_without_mutation() {
        let yaml = r#"
flows:
  - id: initial
    nodes:
      - question: "May I have your full name, please?"
        policy: semantic
"#;
        let (engine, mut session) = engine_with(yaml);
        engine.welcome(&mut session);
        engine.evaluate(&mut session, "asdf");

        let turn = engine.resolve_semantic(&mut session, "asdf", false);

        assert!(turn.response.contains("May I have your full name, please?"));
        assert_eq!(session.cursor(), 0);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn partial_document_inserts_side_follow_up_without_advancing() {
        let yaml = r#"
flows:
  - id: initial
    nodes:
      - question: "Please upload the front and back sides of your Emirates ID."
        policy:
          document: identity
      - question: "Anything else?"
        policy: accept
"#;
        let (engine, mut session) = engine_with(yaml);
        engine.welcome(&mut session);

        let back_only = r#"{"card_number": "11223344"}"#;
        let turn = resolved(engine.evaluate(&mut session, back_only));

        assert_eq!(turn.question.as_deref(), Some(FRONT_FOLLOW_UP));
        assert_eq!(session.cursor(), 0);
        assert!(session.node_identities().contains(&FRONT_FOLLOW_UP));
        assert!(session
            .answers()
            .get("Please upload the front and back sides of your Emirates ID.")
            .map(AnswerValue::is_pending)
            .unwrap_or(false));

        // The follow-up is idempotent: a repeated back-side upload does not
        // splice a second front-side request.
        resolved(engine.evaluate(&mut session, back_only));
        let follow_ups = session
            .node_identities()
            .iter()
            .filter(|&&q| q == FRONT_FOLLOW_UP)
            .count();
        assert_eq!(follow_ups, 1);

        let front = r#"{"name": "Fatima Hassan", "date_of_birth": "21/03/1990"}"#;
        let turn = resolved(engine.evaluate(&mut session, front));

        assert_eq!(turn.question.as_deref(), Some("Anything else?"));
        assert_eq!(session.cursor(), 1);
        assert!(!session.node_identities().contains(&FRONT_FOLLOW_UP));
        assert!(!session.node_identities().contains(&BACK_FOLLOW_UP));
    }

    #[test]
    fn document_completion_records_field_map_under_question() {
        let yaml = r#"
flows:
  - id: initial
    nodes:
      - question: "Please upload your vehicle registration card (Mulkiya)."
        policy:
          document: vehicle_registration
"#;
        let (engine, mut session) = engine_with(yaml);
        engine.welcome(&mut session);

        let payload = r#"{"owner": "Fatima Hassan", "chassis_number": "CH-99"}"#;
        let turn = resolved(engine.evaluate(&mut session, payload));

        assert!(turn.completion.is_some());
        match session
            .answers()
            .get("Please upload your vehicle registration card (Mulkiya).")
        {
            Some(AnswerValue::Document(fields)) => {
                assert_eq!(fields.get("chassis_number").map(String::as_str), Some("CH-99"));
            }
            other => panic!("expected document answer, got {:?}", other),
        }
    }
}
