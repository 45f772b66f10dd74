//! Session aggregate - one user's conversation state.

use crate::domain::catalog::{FlowId, QuestionNode};
use crate::domain::foundation::{StateMachine, Timestamp, UserId};

use super::{AnswerMap, AnswerValue, FieldMap};

/// Lifecycle phase of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationPhase {
    /// Session exists but the greeting has not been sent yet.
    AwaitingWelcome,
    /// Questions are being asked and answered.
    InFlow,
    /// The active flow's last question has been answered.
    Complete,
}

impl StateMachine for ConversationPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConversationPhase::*;
        matches!((self, target), (AwaitingWelcome, InFlow) | (InFlow, Complete))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConversationPhase::*;
        match self {
            AwaitingWelcome => vec![InFlow],
            InFlow => vec![Complete],
            Complete => vec![],
        }
    }
}

/// Which sides of a two-sided document have arrived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentSides {
    pub front: bool,
    pub back: bool,
}

impl DocumentSides {
    /// Returns true once both sides have been received.
    pub fn all_received(&self) -> bool {
        self.front && self.back
    }
}

/// Per-user conversation state.
///
/// Holds a working copy of the active flow's node sequence; runtime
/// follow-up splices mutate the copy, never the catalog. The cursor is
/// always a valid index into `nodes` except at completion, where
/// `cursor == nodes.len()`.
#[derive(Debug, Clone)]
pub struct Session {
    user_id: UserId,
    flow: FlowId,
    nodes: Vec<QuestionNode>,
    cursor: usize,
    answers: AnswerMap,
    phase: ConversationPhase,
    welcome_shown: bool,
    sides: DocumentSides,
    doc_fields: FieldMap,
    persisted: bool,
    last_activity: Timestamp,
}

impl Session {
    /// Creates a fresh session positioned at the start of `flow`.
    pub fn new(user_id: UserId, flow: FlowId, nodes: Vec<QuestionNode>) -> Self {
        Self {
            user_id,
            flow,
            nodes,
            cursor: 0,
            answers: AnswerMap::new(),
            phase: ConversationPhase::AwaitingWelcome,
            welcome_shown: false,
            sides: DocumentSides::default(),
            doc_fields: FieldMap::new(),
            persisted: false,
            last_activity: Timestamp::now(),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn flow(&self) -> FlowId {
        self.flow
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    pub fn welcome_shown(&self) -> bool {
        self.welcome_shown
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn sides(&self) -> DocumentSides {
        self.sides
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn last_activity(&self) -> Timestamp {
        self.last_activity
    }

    /// The node the conversation is currently waiting on, or None at
    /// completion.
    pub fn current_node(&self) -> Option<&QuestionNode> {
        self.nodes.get(self.cursor)
    }

    /// Number of nodes in the session's working sequence.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true once the cursor has moved past the last node.
    pub fn is_flow_finished(&self) -> bool {
        self.cursor >= self.nodes.len()
    }

    /// Marks the one-time greeting as sent and enters the flow.
    ///
    /// Idempotent: calling again once in flow changes nothing.
    pub fn mark_welcome_shown(&mut self) {
        self.welcome_shown = true;
        if self.phase.can_transition_to(&ConversationPhase::InFlow) {
            self.phase = ConversationPhase::InFlow;
        }
        self.touch();
    }

    /// Records an accepted answer under its question identity.
    pub fn record_answer(&mut self, key: impl Into<String>, value: AnswerValue) {
        self.answers.insert(key, value);
        self.touch();
    }

    /// Records a null placeholder for a question whose follow-up is still
    /// outstanding.
    pub fn mark_pending(&mut self, key: impl Into<String>) {
        self.answers.insert(key, AnswerValue::Pending);
        self.touch();
    }

    /// Moves the cursor to the next node, saturating at the terminal
    /// position.
    pub fn advance(&mut self) {
        if self.cursor < self.nodes.len() {
            self.cursor += 1;
        }
        self.touch();
    }

    /// Splices follow-up nodes immediately after the current node.
    ///
    /// Insertion is idempotent: a follow-up whose identity already exists in
    /// the working sequence is skipped, and later follow-ups keep their
    /// position after it. Returns how many nodes were actually inserted.
    pub fn insert_follow_ups(&mut self, follow_ups: &[QuestionNode]) -> usize {
        let mut at = (self.cursor + 1).min(self.nodes.len());
        let mut inserted = 0;
        for follow_up in follow_ups {
            if let Some(existing) = self.position_of(follow_up.identity()) {
                at = existing + 1;
            } else {
                self.nodes.insert(at, follow_up.clone());
                at += 1;
                inserted += 1;
            }
        }
        if inserted > 0 {
            self.touch();
        }
        inserted
    }

    /// Removes follow-up nodes by identity.
    ///
    /// Only nodes strictly after the cursor are eligible: already-visited
    /// questions stay. Removing an absent node is a no-op. Returns how many
    /// nodes were removed.
    pub fn remove_follow_ups<'a>(&mut self, identities: impl IntoIterator<Item = &'a str>) -> usize {
        let mut removed = 0;
        for identity in identities {
            if let Some(idx) = self.position_of(identity) {
                if idx > self.cursor {
                    self.nodes.remove(idx);
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// Switches to a new flow, resetting the cursor to its first question.
    pub fn switch_flow(&mut self, flow: FlowId, nodes: Vec<QuestionNode>) {
        self.flow = flow;
        self.nodes = nodes;
        self.cursor = 0;
        self.reset_document_state();
        self.touch();
    }

    /// Marks the conversation complete. Only valid while in flow.
    pub fn complete(&mut self) {
        if self.phase.can_transition_to(&ConversationPhase::Complete) {
            self.phase = ConversationPhase::Complete;
        }
        self.touch();
    }

    /// Records that the final answer set reached the persistence
    /// collaborator.
    pub fn mark_persisted(&mut self) {
        self.persisted = true;
        self.touch();
    }

    /// Marks a document side as received.
    pub fn mark_side(&mut self, front: bool, back: bool) {
        self.sides.front |= front;
        self.sides.back |= back;
        self.touch();
    }

    /// Folds extracted fields into the in-progress document buffer.
    ///
    /// Non-empty values win over empty ones; a later re-upload never blanks
    /// a field that was already read.
    pub fn absorb_document_fields(&mut self, fields: &FieldMap) {
        for (key, value) in fields {
            if value.is_empty() {
                continue;
            }
            self.doc_fields.insert(key.clone(), value.clone());
        }
        self.touch();
    }

    /// Takes the accumulated document buffer, clearing document state.
    pub fn take_document_fields(&mut self) -> FieldMap {
        self.sides = DocumentSides::default();
        std::mem::take(&mut self.doc_fields)
    }

    /// Clears per-document progress (sides and buffered fields).
    pub fn reset_document_state(&mut self) {
        self.sides = DocumentSides::default();
        self.doc_fields.clear();
    }

    /// Refreshes the idle clock.
    pub fn touch(&mut self) {
        self.last_activity = Timestamp::now();
    }

    /// Sets the idle clock to a specific instant.
    pub fn touch_at(&mut self, at: Timestamp) {
        self.last_activity = at;
    }

    /// Seconds this session has been idle as of `now`.
    pub fn idle_secs(&self, now: &Timestamp) -> u64 {
        now.secs_since(&self.last_activity)
    }

    /// Question identities of the working sequence, in order.
    pub fn node_identities(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.identity()).collect()
    }

    fn position_of(&self, identity: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.identity() == identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::SlotPolicy;
    use proptest::prelude::*;

    fn node(q: &str) -> QuestionNode {
        QuestionNode::new(q, SlotPolicy::Accept)
    }

    fn session_with(questions: &[&str]) -> Session {
        Session::new(
            UserId::new("user-1").unwrap(),
            FlowId::Medical,
            questions.iter().map(|q| node(q)).collect(),
        )
    }

    #[test]
    fn new_session_awaits_welcome_at_cursor_zero() {
        let session = session_with(&["q1", "q2"]);
        assert_eq!(session.phase(), ConversationPhase::AwaitingWelcome);
        assert_eq!(session.cursor(), 0);
        assert!(!session.welcome_shown());
    }

    #[test]
    fn mark_welcome_shown_enters_flow_exactly_once() {
        let mut session = session_with(&["q1"]);
        session.mark_welcome_shown();
        assert!(session.welcome_shown());
        assert_eq!(session.phase(), ConversationPhase::InFlow);

        // A second call is a no-op.
        session.mark_welcome_shown();
        assert_eq!(session.phase(), ConversationPhase::InFlow);
    }

    #[test]
    fn insert_follow_ups_lands_immediately_after_cursor() {
        let mut session = session_with(&["q1", "q2", "q3"]);
        session.mark_welcome_shown();

        let inserted = session.insert_follow_ups(&[node("f1"), node("f2")]);
        assert_eq!(inserted, 2);
        assert_eq!(
            session.node_identities(),
            vec!["q1", "f1", "f2", "q2", "q3"]
        );
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn insert_is_idempotent() {
        let mut session = session_with(&["q1", "q2"]);
        session.mark_welcome_shown();

        assert_eq!(session.insert_follow_ups(&[node("f1")]), 1);
        assert_eq!(session.insert_follow_ups(&[node("f1")]), 0);
        assert_eq!(session.node_count(), 3);
    }

    #[test]
    fn remove_is_idempotent_and_skips_visited_nodes() {
        let mut session = session_with(&["q1", "q2"]);
        session.mark_welcome_shown();
        session.insert_follow_ups(&[node("f1")]);

        assert_eq!(session.remove_follow_ups(["f1"]), 1);
        assert_eq!(session.remove_follow_ups(["f1"]), 0);
        // Removing the question at the cursor is refused.
        assert_eq!(session.remove_follow_ups(["q1"]), 0);
        assert_eq!(session.node_count(), 2);
    }

    #[test]
    fn advance_saturates_at_terminal_position() {
        let mut session = session_with(&["q1"]);
        session.mark_welcome_shown();
        session.advance();
        assert!(session.is_flow_finished());
        session.advance();
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn switch_flow_resets_cursor() {
        let mut session = session_with(&["q1", "q2", "q3"]);
        session.mark_welcome_shown();
        session.advance();
        session.advance();
        assert_eq!(session.cursor(), 2);

        session.switch_flow(FlowId::Car, vec![node("car-q1")]);
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.flow(), FlowId::Car);
        assert_eq!(session.current_node().map(|n| n.identity()), Some("car-q1"));
    }

    #[test]
    fn document_buffer_prefers_non_empty_values() {
        let mut session = session_with(&["doc"]);
        let mut first = FieldMap::new();
        first.insert("name".to_string(), "Fatima".to_string());
        first.insert("card_number".to_string(), String::new());
        session.absorb_document_fields(&first);

        let mut second = FieldMap::new();
        second.insert("name".to_string(), String::new());
        second.insert("card_number".to_string(), "123".to_string());
        session.absorb_document_fields(&second);

        let merged = session.take_document_fields();
        assert_eq!(merged.get("name").map(String::as_str), Some("Fatima"));
        assert_eq!(merged.get("card_number").map(String::as_str), Some("123"));
        assert_eq!(session.sides(), DocumentSides::default());
    }

    #[test]
    fn idle_secs_tracks_last_activity() {
        let mut session = session_with(&["q1"]);
        let past = Timestamp::now().minus_secs(120);
        session.touch_at(past);
        let now = Timestamp::now();
        assert!(session.idle_secs(&now) >= 120);
    }

    proptest! {
        /// insert(insert(S, N)) == insert(S, N) for any follow-up batch.
        #[test]
        fn insert_twice_equals_insert_once(batch in proptest::collection::vec("[a-f][0-9]", 1..5)) {
            let mut once = session_with(&["q1", "q2"]);
            once.mark_welcome_shown();
            let follow_ups: Vec<QuestionNode> = batch.iter().map(|q| node(q)).collect();

            once.insert_follow_ups(&follow_ups);
            let mut twice = once.clone();
            let inserted_again = twice.insert_follow_ups(&follow_ups);

            prop_assert_eq!(inserted_again, 0);
            prop_assert_eq!(twice.node_count(), once.node_count());
        }

        /// Removal of an absent identity never changes the sequence.
        #[test]
        fn remove_absent_is_noop(identity in "[x-z]{3,8}") {
            let mut session = session_with(&["q1", "q2"]);
            session.mark_welcome_shown();
            let before = session.node_count();
            prop_assert_eq!(session.remove_follow_ups([identity.as_str()]), 0);
            prop_assert_eq!(session.node_count(), before);
        }
    }
}
