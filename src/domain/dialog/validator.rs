//! Slot validation - per-node answer checks.
//!
//! Deterministic, side-effect-free checks (option membership, format rules)
//! are resolved here. Slots that need the semantic collaborator surface
//! `Deterministic::NeedsSemantic`, so an external call is only ever made
//! once every local check has had its say.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::catalog::{FlowId, FormatRule, QuestionNode, SlotPolicy};
use crate::domain::session::AnswerValue;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\+971|0)5\d{8}$").expect("valid phone regex"));

static EMIRATES_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^784-\d{4}-\d{7}-\d$").expect("valid emirates id regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("valid date regex"));

static POLICY_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^POL-\d{6}$").expect("valid policy number regex"));

/// Result of evaluating one answer against one node.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Answer accepted; store the value and move on.
    Accepted(AnswerValue),
    /// Answer selected a flow-selector option; switch to the target flow.
    AcceptedWithBranch(FlowId),
    /// Answer did not satisfy the slot policy; re-ask.
    Rejected { retry_prompt: String },
}

/// Outcome of the deterministic validation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Deterministic {
    Outcome(ValidationOutcome),
    /// No local rule applies; ask the semantic collaborator.
    NeedsSemantic,
}

/// Runs the deterministic checks for a node.
///
/// Document slots never reach this function; the engine merges them before
/// validation. A node with a fixed option set is always checked by
/// membership, whatever its policy tag says.
pub fn check(node: &QuestionNode, answer: &str) -> Deterministic {
    let answer = answer.trim();

    if node.has_options() {
        return Deterministic::Outcome(check_options(node, answer));
    }

    match node.policy {
        SlotPolicy::AnyOf => Deterministic::Outcome(check_options(node, answer)),
        SlotPolicy::Format(rule) => Deterministic::Outcome(check_format(node, rule, answer)),
        SlotPolicy::Semantic => Deterministic::NeedsSemantic,
        SlotPolicy::Accept | SlotPolicy::Document(_) => {
            Deterministic::Outcome(ValidationOutcome::Accepted(AnswerValue::text(answer)))
        }
    }
}

/// Case-sensitive membership in the node's option set.
fn check_options(node: &QuestionNode, answer: &str) -> ValidationOutcome {
    if node.options.iter().any(|o| o == answer) {
        if let Some(target) = node.branch_target(answer) {
            return ValidationOutcome::AcceptedWithBranch(target);
        }
        return ValidationOutcome::Accepted(AnswerValue::text(answer));
    }

    ValidationOutcome::Rejected {
        retry_prompt: format!(
            "Sorry, that is not one of the options I can accept. {}\nPlease choose one of: {}",
            node.identity(),
            node.options.join(" | ")
        ),
    }
}

fn check_format(node: &QuestionNode, rule: FormatRule, answer: &str) -> ValidationOutcome {
    if rule.matches(answer) {
        ValidationOutcome::Accepted(AnswerValue::text(answer))
    } else {
        ValidationOutcome::Rejected {
            retry_prompt: format!(
                "That does not look like {}. A valid example is {}. {}",
                rule.describe(),
                rule.example(),
                node.identity()
            ),
        }
    }
}

impl FormatRule {
    /// Returns true if the answer satisfies this rule.
    pub fn matches(&self, answer: &str) -> bool {
        match self {
            FormatRule::Phone => PHONE_RE.is_match(answer),
            FormatRule::EmiratesId => EMIRATES_ID_RE.is_match(answer),
            FormatRule::Email => EMAIL_RE.is_match(answer),
            FormatRule::Date => {
                DATE_RE.is_match(answer)
                    && NaiveDate::parse_from_str(answer, "%d/%m/%Y").is_ok()
            }
            FormatRule::PolicyNumber => POLICY_NUMBER_RE.is_match(answer),
            FormatRule::IntRange { min, max } => answer
                .parse::<i64>()
                .map(|n| n >= *min && n <= *max)
                .unwrap_or(false),
        }
    }

    /// Human-readable description used in retry prompts.
    pub fn describe(&self) -> String {
        match self {
            FormatRule::Phone => "a UAE mobile number".to_string(),
            FormatRule::EmiratesId => "an Emirates ID number".to_string(),
            FormatRule::Email => "an email address".to_string(),
            FormatRule::Date => "a date in DD/MM/YYYY format".to_string(),
            FormatRule::PolicyNumber => "a policy number".to_string(),
            FormatRule::IntRange { min, max } => {
                format!("a whole number between {} and {}", min, max)
            }
        }
    }

    /// Canonical example of valid input for retry prompts.
    pub fn example(&self) -> String {
        match self {
            FormatRule::Phone => "0501234567".to_string(),
            FormatRule::EmiratesId => "784-1990-1234567-0".to_string(),
            FormatRule::Email => "name@example.com".to_string(),
            FormatRule::Date => "21/03/1990".to_string(),
            FormatRule::PolicyNumber => "POL-123456".to_string(),
            FormatRule::IntRange { min, max } => ((min + max) / 2).to_string(),
        }
    }
}
