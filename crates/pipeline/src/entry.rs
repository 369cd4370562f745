//! Input entries and their canonical prompt form.
//!
//! An [`Entry`] is one record of the input array. Only the four fields the
//! prompt needs are kept; anything else in the record is ignored. Field values
//! are held as raw JSON so that a numeric `year` reaches the model as a number
//! and a string `year` as a string, exactly as they appeared in the input.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::EntryId;

fn empty_string() -> Value {
    Value::String(String::new())
}

fn unknown_id() -> Value {
    Value::String(EntryId::UNKNOWN.to_string())
}

/// One unit of work read from the input sequence.
///
/// Absent fields default to the empty string, except `id`, which defaults to
/// [`EntryId::UNKNOWN`]. A field that is present but `null` stays `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default = "unknown_id")]
    id: Value,
    #[serde(default = "empty_string")]
    rubric: Value,
    #[serde(default = "empty_string")]
    year: Value,
    #[serde(default = "empty_string", rename = "entry")]
    body: Value,
}

impl Entry {
    /// The entry's identifier.
    ///
    /// String identifiers are used verbatim; other JSON values (numbers, for
    /// example) use their JSON text. A `null` identifier maps to the sentinel.
    pub fn id(&self) -> EntryId {
        match &self.id {
            Value::String(s) => EntryId::new(s.clone()),
            Value::Null => EntryId::unknown(),
            other => EntryId::new(other.to_string()),
        }
    }

    /// Renders the entry as the user message sent to the model.
    ///
    /// The form is a pretty-printed JSON object with keys `id`, `rubric`,
    /// `year` and `entry`, in that order, with non-ASCII text kept verbatim.
    pub fn to_user_prompt(&self) -> String {
        // Serialising a struct of plain JSON values cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Parses a JSON array of entries.
pub fn parse_entries(json: &str) -> Result<Vec<Entry>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let entries = parse_entries(r#"[{"entry": "x"}]"#).unwrap();
        assert_eq!(entries[0].id().as_str(), "UNKNOWN_ID");
        assert_eq!(
            entries[0].to_user_prompt(),
            "{\n  \"id\": \"UNKNOWN_ID\",\n  \"rubric\": \"\",\n  \"year\": \"\",\n  \"entry\": \"x\"\n}"
        );
    }

    #[test]
    fn prompt_preserves_value_types_and_key_order() {
        let entries =
            parse_entries(r#"[{"year": 1734, "entry": "Zinß", "id": "A1", "rubric": "Bier"}]"#)
                .unwrap();
        assert_eq!(
            entries[0].to_user_prompt(),
            "{\n  \"id\": \"A1\",\n  \"rubric\": \"Bier\",\n  \"year\": 1734,\n  \"entry\": \"Zinß\"\n}"
        );
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let entries = parse_entries(r#"[{"id": "A1", "page": 12}]"#).unwrap();
        assert!(!entries[0].to_user_prompt().contains("page"));
    }

    #[test]
    fn numeric_and_null_ids() {
        let entries = parse_entries(r#"[{"id": 42}, {"id": null}]"#).unwrap();
        assert_eq!(entries[0].id().as_str(), "42");
        assert_eq!(entries[1].id().as_str(), "UNKNOWN_ID");
    }

    #[test]
    fn input_order_is_preserved() {
        let entries = parse_entries(r#"[{"id": "b"}, {"id": "a"}, {"id": "c"}]"#).unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id().to_string()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn non_array_input_is_rejected() {
        assert!(parse_entries(r#"{"id": "A1"}"#).is_err());
    }
}
