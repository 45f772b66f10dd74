//! Question nodes and their validation/branch policies.

use serde::{Deserialize, Serialize};

use super::FlowId;

/// One question within a flow.
///
/// `question` is the exact text shown to the user and the key under which
/// the answer is recorded. It is unique within a flow (enforced at catalog
/// load). The validation policy is attached data, never inferred from the
/// question text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionNode {
    /// Exact question text; doubles as the answer key.
    pub question: String,

    /// Ordered set of permitted literal answers. Empty means free-form.
    #[serde(default)]
    pub options: Vec<String>,

    /// How an answer to this node is validated.
    pub policy: SlotPolicy,

    /// Branch/splice rules evaluated when an answer is accepted.
    #[serde(default)]
    pub on_answer: Vec<AnswerRule>,
}

impl QuestionNode {
    /// Creates a free-form node with the given policy and no rules.
    pub fn new(question: impl Into<String>, policy: SlotPolicy) -> Self {
        Self {
            question: question.into(),
            options: Vec::new(),
            policy,
            on_answer: Vec::new(),
        }
    }

    /// The question text, which identifies this node within its flow.
    pub fn identity(&self) -> &str {
        &self.question
    }

    /// Returns true if this node restricts answers to a fixed option set.
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    /// Looks up the flow switched to when `answer` is selected, if any.
    pub fn branch_target(&self, answer: &str) -> Option<FlowId> {
        self.on_answer.iter().find_map(|rule| match rule {
            AnswerRule::SwitchFlow { answer: a, target } if a == answer => Some(*target),
            _ => None,
        })
    }
}

/// Validation policy for one slot, chosen by the node it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPolicy {
    /// Case-sensitive membership in the node's option set.
    AnyOf,
    /// Regex/structural check with a canonical example for retry prompts.
    Format(FormatRule),
    /// Delegated free-text classification via the semantic collaborator.
    Semantic,
    /// Store the answer as-is.
    Accept,
    /// Answer is a JSON field map produced by the document upload endpoint.
    Document(DocumentKind),
}

/// Structural format checks for free-form slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatRule {
    /// UAE mobile number.
    Phone,
    /// Emirates ID number, e.g. 784-1990-1234567-0.
    EmiratesId,
    /// Email address.
    Email,
    /// Calendar date in DD/MM/YYYY.
    Date,
    /// Policy reference, e.g. POL-123456.
    PolicyNumber,
    /// Integer within an inclusive range.
    IntRange { min: i64, max: i64 },
}

/// Kinds of documents the extraction collaborator understands.
///
/// Each kind has a fixed field schema; missing fields come back as empty
/// strings, never absent keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Emirates ID card, front and back sides.
    Identity,
    /// Vehicle registration card (Mulkiya).
    VehicleRegistration,
    /// Medical report accompanying a health declaration.
    MedicalReport,
    /// Supporting evidence for a claim (photos, police report).
    ClaimEvidence,
}

impl DocumentKind {
    /// Fixed field schema for this document kind.
    pub fn schema_keys(&self) -> &'static [&'static str] {
        match self {
            DocumentKind::Identity => &[
                "name",
                "id_number",
                "date_of_birth",
                "nationality",
                "issue_date",
                "expiry_date",
                "gender",
                "card_number",
                "occupation",
                "employer",
                "issuing_place",
            ],
            DocumentKind::VehicleRegistration => &[
                "owner",
                "nationality",
                "traffic_plate_number",
                "place_of_issue",
                "registration_date",
                "expiry_date",
                "insurance_company",
                "model",
                "origin",
                "engine_number",
                "chassis_number",
            ],
            DocumentKind::MedicalReport => {
                &["document_type", "patient_name", "issue_date", "summary"]
            }
            DocumentKind::ClaimEvidence => &["document_type", "description", "date"],
        }
    }

    /// Instruction handed to the extraction collaborator.
    pub fn extraction_instruction(&self) -> &'static str {
        match self {
            DocumentKind::Identity => {
                "Extract all printed fields from this Emirates ID card side"
            }
            DocumentKind::VehicleRegistration => {
                "Extract all printed fields from this vehicle registration card"
            }
            DocumentKind::MedicalReport => "Summarize the key fields of this medical report",
            DocumentKind::ClaimEvidence => "Describe this claim evidence document",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocumentKind::Identity => "identity",
            DocumentKind::VehicleRegistration => "vehicle_registration",
            DocumentKind::MedicalReport => "medical_report",
            DocumentKind::ClaimEvidence => "claim_evidence",
        };
        write!(f, "{}", s)
    }
}

/// Branch or splice rule evaluated against an accepted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerRule {
    /// Selecting `answer` switches the session to `target` at cursor 0.
    SwitchFlow { answer: String, target: FlowId },
    /// Giving `answer` splices `nodes` immediately after the current node.
    /// Any other answer removes those nodes if previously inserted.
    InsertFollowUps {
        answer: String,
        nodes: Vec<QuestionNode>,
    },
}
