//! Collected answers, keyed by question identity in insertion order.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Structured field map produced by the document extraction collaborator.
///
/// Missing fields are empty strings, never absent keys.
pub type FieldMap = BTreeMap<String, String>;

/// One collected answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Plain text answer.
    Text(String),
    /// Structured document-field map from an upload.
    Document(FieldMap),
    /// Placeholder while a follow-up (e.g. the other document side) is
    /// still outstanding. Serializes as null.
    Pending,
}

impl AnswerValue {
    /// Convenience constructor for text answers.
    pub fn text(value: impl Into<String>) -> Self {
        AnswerValue::Text(value.into())
    }

    /// Returns the text content, if this is a text answer.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true while the answer is still awaiting a follow-up.
    pub fn is_pending(&self) -> bool {
        matches!(self, AnswerValue::Pending)
    }
}

/// Ordered mapping from question identity to answer value.
///
/// Preserves insertion order so the persisted answer set reads in the order
/// the conversation asked its questions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerMap {
    entries: Vec<(String, AnswerValue)>,
}

impl AnswerMap {
    /// Creates an empty answer map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the value for a key, preserving its original
    /// position on replacement.
    pub fn insert(&mut self, key: impl Into<String>, value: AnswerValue) {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Looks up the value for a key.
    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Returns true if the key has been answered (including pending).
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Number of collected answers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no answers have been collected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for AnswerMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AnswerMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AnswerMapVisitor;

        impl<'de> Visitor<'de> for AnswerMapVisitor {
            type Value = AnswerMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of question identities to answers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = AnswerMap::new();
                while let Some((key, value)) = access.next_entry::<String, AnswerValue>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(AnswerMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_preserves_order() {
        let mut answers = AnswerMap::new();
        answers.insert("b", AnswerValue::text("2"));
        answers.insert("a", AnswerValue::text("1"));
        answers.insert("c", AnswerValue::text("3"));

        let keys: Vec<&str> = answers.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn replacement_keeps_original_position() {
        let mut answers = AnswerMap::new();
        answers.insert("a", AnswerValue::Pending);
        answers.insert("b", AnswerValue::text("2"));
        answers.insert("a", AnswerValue::text("1"));

        let keys: Vec<&str> = answers.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(answers.get("a"), Some(&AnswerValue::text("1")));
    }

    #[test]
    fn serializes_as_ordered_json_object() {
        let mut answers = AnswerMap::new();
        answers.insert("What is your name?", AnswerValue::text("Fatima"));
        answers.insert("Pending question?", AnswerValue::Pending);

        let json = serde_json::to_string(&answers).unwrap();
        assert_eq!(
            json,
            r#"{"What is your name?":"Fatima","Pending question?":null}"#
        );
    }

    #[test]
    fn document_value_serializes_as_object() {
        let mut fields = FieldMap::new();
        fields.insert("name".to_string(), "Fatima".to_string());
        let mut answers = AnswerMap::new();
        answers.insert("Upload ID", AnswerValue::Document(fields));

        let json = serde_json::to_string(&answers).unwrap();
        assert!(json.contains(r#""Upload ID":{"name":"Fatima"}"#));
    }

    #[test]
    fn deserializes_round_trip() {
        let mut answers = AnswerMap::new();
        answers.insert("q1", AnswerValue::text("yes"));
        answers.insert("q2", AnswerValue::Pending);

        let json = serde_json::to_string(&answers).unwrap();
        let back: AnswerMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, answers);
    }

    #[test]
    fn pending_is_reported() {
        assert!(AnswerValue::Pending.is_pending());
        assert!(!AnswerValue::text("x").is_pending());
    }
}
