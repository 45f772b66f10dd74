//! Document merge - folds OCR field maps into the session's answers.
//!
//! Document answers arrive as JSON-encoded field maps (the chat caller
//! echoes the upload endpoint's response back as a message). Two-sided
//! documents are assembled across several uploads; the engine keeps the
//! cursor on the document question until every required side has arrived.

use serde_json::Value;

use crate::domain::catalog::{DocumentKind, QuestionNode, SlotPolicy};
use crate::domain::session::{FieldMap, Session};

/// Follow-up question asking for the missing front side.
pub const FRONT_FOLLOW_UP: &str = "Please upload the front side of your Emirates ID.";

/// Follow-up question asking for the missing back side.
pub const BACK_FOLLOW_UP: &str = "Please upload the back side of your Emirates ID.";

/// Fields printed on the front of an Emirates ID.
const IDENTITY_FRONT_LABELS: &[(&str, &str)] = &[
    ("name", "Name"),
    ("id_number", "Emirates ID Number"),
    ("date_of_birth", "Date of Birth"),
    ("nationality", "Nationality"),
    ("issue_date", "ID Issue Date"),
    ("expiry_date", "ID Expiry Date"),
    ("gender", "Gender"),
];

/// Fields printed on the back of an Emirates ID.
const IDENTITY_BACK_LABELS: &[(&str, &str)] = &[
    ("card_number", "ID Card Number"),
    ("occupation", "Occupation"),
    ("employer", "Employer"),
    ("issuing_place", "ID Issuing Place"),
];

const VEHICLE_LABELS: &[(&str, &str)] = &[
    ("owner", "Vehicle Owner"),
    ("nationality", "Owner Nationality"),
    ("traffic_plate_number", "Traffic Plate Number"),
    ("place_of_issue", "Registration Place of Issue"),
    ("registration_date", "Registration Date"),
    ("expiry_date", "Registration Expiry Date"),
    ("insurance_company", "Current Insurance Company"),
    ("model", "Vehicle Model"),
    ("origin", "Vehicle Origin"),
    ("engine_number", "Engine Number"),
    ("chassis_number", "Chassis Number"),
];

/// Result of merging one uploaded field map.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// Every required side is in; the engine may advance past the document
    /// question. `fields` is the assembled map across all uploads.
    Complete { fields: FieldMap },
    /// One side arrived but another is still required. The engine splices
    /// `follow_up` in and keeps the cursor where it is.
    AwaitingSide { follow_up: QuestionNode },
    /// The payload parsed but carried none of the expected markers.
    Unreadable { prompt: String },
    /// The payload was not a JSON field map at all.
    Malformed { prompt: String },
}

/// Parses a chat message into a field map.
///
/// Accepts a JSON object whose values are strings (numbers are tolerated
/// and stringified, since OCR backends disagree on numeric fields).
pub fn parse_field_map(raw: &str) -> Option<FieldMap> {
    let value: Value = serde_json::from_str(raw.trim()).ok()?;
    let object = value.as_object()?;

    let mut map = FieldMap::new();
    for (key, value) in object {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Null => String::new(),
            _ => return None,
        };
        map.insert(key.clone(), text);
    }
    Some(map)
}

/// Merges one uploaded field map into the session.
///
/// Marks received sides, copies recognized fields into named response keys,
/// and reports whether the document question can be left behind.
pub fn merge(session: &mut Session, kind: DocumentKind, raw: &str) -> MergeOutcome {
    let Some(map) = parse_field_map(raw) else {
        return MergeOutcome::Malformed {
            prompt: format!(
                "I could not read that as a document. Please use the upload endpoint and send \
                 me its JSON reply, e.g. {}",
                example_payload(kind)
            ),
        };
    };

    match kind {
        DocumentKind::Identity => merge_identity(session, map),
        DocumentKind::VehicleRegistration => merge_vehicle(session, map),
        DocumentKind::MedicalReport | DocumentKind::ClaimEvidence => {
            merge_single_shot(session, map)
        }
    }
}

/// Emirates ID: front carries name and date of birth, back carries the card
/// number. Both sides are required.
fn merge_identity(session: &mut Session, map: FieldMap) -> MergeOutcome {
    let front_seen = non_empty(&map, "name") && non_empty(&map, "date_of_birth");
    let back_seen = non_empty(&map, "card_number");

    if !front_seen && !back_seen {
        return MergeOutcome::Unreadable {
            prompt: "I could not recognize either side of the Emirates ID in that upload. \
                     Please upload a clear photo of the card."
                .to_string(),
        };
    }

    session.mark_side(front_seen, back_seen);
    session.absorb_document_fields(&map);
    if front_seen {
        copy_labeled(session, &map, IDENTITY_FRONT_LABELS);
    }
    if back_seen {
        copy_labeled(session, &map, IDENTITY_BACK_LABELS);
    }

    if session.sides().all_received() {
        let fields = session.take_document_fields();
        return MergeOutcome::Complete { fields };
    }

    let follow_up = if session.sides().front {
        QuestionNode::new(BACK_FOLLOW_UP, SlotPolicy::Document(DocumentKind::Identity))
    } else {
        QuestionNode::new(FRONT_FOLLOW_UP, SlotPolicy::Document(DocumentKind::Identity))
    };
    MergeOutcome::AwaitingSide { follow_up }
}

/// Vehicle registration: a single upload identified by its chassis number.
fn merge_vehicle(session: &mut Session, map: FieldMap) -> MergeOutcome {
    if !non_empty(&map, "chassis_number") {
        return MergeOutcome::Unreadable {
            prompt: "I could not find the chassis number on that card. Please upload a clear \
                     photo of your vehicle registration card."
                .to_string(),
        };
    }

    session.absorb_document_fields(&map);
    copy_labeled(session, &map, VEHICLE_LABELS);
    let fields = session.take_document_fields();
    MergeOutcome::Complete { fields }
}

/// Reports and evidence documents: accepted whole, no required markers.
fn merge_single_shot(session: &mut Session, map: FieldMap) -> MergeOutcome {
    if map.values().all(|v| v.is_empty()) {
        return MergeOutcome::Unreadable {
            prompt: "I could not read anything from that document. Please upload a clearer copy."
                .to_string(),
        };
    }

    session.absorb_document_fields(&map);
    let fields = session.take_document_fields();
    MergeOutcome::Complete { fields }
}

fn non_empty(map: &FieldMap, key: &str) -> bool {
    map.get(key).map(|v| !v.is_empty()).unwrap_or(false)
}

fn copy_labeled(session: &mut Session, map: &FieldMap, labels: &[(&str, &str)]) {
    for (field, label) in labels {
        if let Some(value) = map.get(*field) {
            if !value.is_empty() {
                session.record_answer(*label, crate::domain::session::AnswerValue::text(value));
            }
        }
    }
}

fn example_payload(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Identity => r#"{"name": "...", "id_number": "784-...", "card_number": "..."}"#,
        DocumentKind::VehicleRegistration => r#"{"owner": "...", "chassis_number": "..."}"#,
        DocumentKind::MedicalReport => r#"{"document_type": "medical_report", "summary": "..."}"#,
        DocumentKind::ClaimEvidence => r#"{"document_type": "police_report", "description": "..."}"#,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::FlowId;
    use crate::domain::foundation::UserId;
    use crate::domain::session::AnswerValue;

    fn doc_session() -> Session {
        let mut session = Session::new(
            UserId::new("user-1").unwrap(),
            FlowId::Medical,
            vec![
                QuestionNode::new("Upload your ID.", SlotPolicy::Document(DocumentKind::Identity)),
                QuestionNode::new("Next question", SlotPolicy::Accept),
            ],
        );
        session.mark_welcome_shown();
        session
    }

    fn back_payload() -> String {
        r#"{"card_number": "11223344", "occupation": "Engineer", "name": "", "date_of_birth": ""}"#
            .to_string()
    }

    fn front_payload() -> String {
        r#"{"name": "Fatima Hassan", "date_of_birth": "21/03/1990", "id_number": "784-1990-1234567-0", "card_number": ""}"#
            .to_string()
    }

    #[test]
    fn parse_rejects_non_json_and_arrays() {
        assert!(parse_field_map("hello").is_none());
        assert!(parse_field_map("[1,2]").is_none());
        assert!(parse_field_map(r#"{"a": {"nested": true}}"#).is_none());
    }

    #[test]
    fn parse_tolerates_numbers_and_null() {
        let map = parse_field_map(r#"{"year": 2020, "note": null}"#).unwrap();
        assert_eq!(map.get("year").map(String::as_str), Some("2020"));
        assert_eq!(map.get("note").map(String::as_str), Some(""));
    }

    #[test]
    fn back_only_upload_requests_front_side() {
        let mut session = doc_session();
        let outcome = merge(&mut session, DocumentKind::Identity, &back_payload());

        match outcome {
            MergeOutcome::AwaitingSide { follow_up } => {
                assert_eq!(follow_up.identity(), FRONT_FOLLOW_UP);
            }
            other => panic!("expected awaiting side, got {:?}", other),
        }
        assert!(session.sides().back);
        assert!(!session.sides().front);
        assert_eq!(
            session.answers().get("ID Card Number"),
            Some(&AnswerValue::text("11223344"))
        );
    }

    #[test]
    fn front_after_back_completes_the_document() {
        let mut session = doc_session();
        merge(&mut session, DocumentKind::Identity, &back_payload());
        let outcome = merge(&mut session, DocumentKind::Identity, &front_payload());

        match outcome {
            MergeOutcome::Complete { fields } => {
                assert_eq!(fields.get("name").map(String::as_str), Some("Fatima Hassan"));
                assert_eq!(fields.get("card_number").map(String::as_str), Some("11223344"));
            }
            other => panic!("expected complete, got {:?}", other),
        }
        assert_eq!(
            session.answers().get("Name"),
            Some(&AnswerValue::text("Fatima Hassan"))
        );
    }

    #[test]
    fn markerless_identity_upload_is_unreadable() {
        let mut session = doc_session();
        let outcome = merge(
            &mut session,
            DocumentKind::Identity,
            r#"{"name": "", "card_number": ""}"#,
        );
        assert!(matches!(outcome, MergeOutcome::Unreadable { .. }));
        assert_eq!(session.sides(), Default::default());
    }

    #[test]
    fn malformed_payload_gets_example_in_prompt() {
        let mut session = doc_session();
        let outcome = merge(&mut session, DocumentKind::Identity, "not json at all");
        match outcome {
            MergeOutcome::Malformed { prompt } => assert!(prompt.contains("upload endpoint")),
            other => panic!("expected malformed, got {:?}", other),
        }
    }

    #[test]
    fn vehicle_registration_requires_chassis_number() {
        let mut session = doc_session();
        let missing = merge(
            &mut session,
            DocumentKind::VehicleRegistration,
            r#"{"owner": "Fatima", "chassis_number": ""}"#,
        );
        assert!(matches!(missing, MergeOutcome::Unreadable { .. }));

        let ok = merge(
            &mut session,
            DocumentKind::VehicleRegistration,
            r#"{"owner": "Fatima", "chassis_number": "CH-99"}"#,
        );
        assert!(matches!(ok, MergeOutcome::Complete { .. }));
        assert_eq!(
            session.answers().get("Chassis Number"),
            Some(&AnswerValue::text("CH-99"))
        );
    }

    #[test]
    fn single_shot_documents_complete_on_any_content() {
        let mut session = doc_session();
        let outcome = merge(
            &mut session,
            DocumentKind::MedicalReport,
            r#"{"document_type": "medical_report", "summary": "All clear"}"#,
        );
        assert!(matches!(outcome, MergeOutcome::Complete { .. }));
    }
}
