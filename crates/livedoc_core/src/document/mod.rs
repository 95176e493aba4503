//! Documents and their fields.
//!
//! A [`Document`] is a mapping from field name to a JSON-representable
//! [`Value`] plus the store-assigned [`DocumentId`]. The identifier is not a
//! field: writes that try to set a field named `id` are rejected by
//! [`validate_fields`].

mod id;

pub use id::DocumentId;

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field map of a document or of a partial write.
pub type Fields = BTreeMap<String, Value>;

/// Name reserved for the document identifier in flattened views.
pub const ID_FIELD: &str = "id";

/// A single record of a collection.
///
/// Serializes flattened as `{"id": ..., <fields>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier.
    pub id: DocumentId,
    /// Field values.
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    /// Creates a document from an id and its fields.
    pub fn new(id: impl Into<DocumentId>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Returns the value of a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a text field.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Returns a numeric field as `f64`.
    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    /// Returns a boolean field.
    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// Renders a scalar field as text for grouping and searching.
    ///
    /// Strings are returned as-is, numbers and booleans in their JSON form.
    /// Null, arrays, objects and missing fields yield `None`.
    pub fn field_text(&self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Builds a field map from `(name, value)` pairs.
pub fn fields<K, V, I>(pairs: I) -> Fields
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Checks that every field name of a write payload is acceptable.
///
/// Names must be non-empty, must not be the reserved `id`, and must not
/// start with `__`.
pub fn validate_fields(fields: &Fields) -> StoreResult<()> {
    for name in fields.keys() {
        if name.is_empty() {
            return Err(StoreError::validation("field names must not be empty"));
        }
        if name == ID_FIELD {
            return Err(StoreError::validation(
                "the `id` field is assigned by the store and cannot be written",
            ));
        }
        if name.starts_with("__") {
            return Err(StoreError::validation(format!(
                "field name `{name}` is reserved"
            )));
        }
    }
    Ok(())
}

/// Formats an instant the way creation timestamps are stored.
///
/// `2024-03-01T08:15:00.000Z`: UTC, millisecond precision.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn accessors() {
        let doc = Document::new(
            "g1",
            fields([
                ("subject", json!("Math")),
                ("value", json!(5.5)),
                ("final", json!(true)),
            ]),
        );
        assert_eq!(doc.get_str("subject"), Some("Math"));
        assert_eq!(doc.get_f64("value"), Some(5.5));
        assert_eq!(doc.get_bool("final"), Some(true));
        assert_eq!(doc.get("missing"), None);
    }

    #[test]
    fn field_text_scalars_only() {
        let doc = Document::new(
            "a1",
            fields([
                ("period", json!(3)),
                ("status", json!("excused")),
                ("tags", json!(["x"])),
            ]),
        );
        assert_eq!(doc.field_text("period").as_deref(), Some("3"));
        assert_eq!(doc.field_text("status").as_deref(), Some("excused"));
        assert_eq!(doc.field_text("tags"), None);
    }

    #[test]
    fn serializes_flattened() {
        let doc = Document::new("m1", fields([("read", json!(false))]));
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value, json!({"id": "m1", "read": false}));

        let back: Document = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn rejects_reserved_names() {
        assert!(validate_fields(&fields([("title", json!("x"))])).is_ok());
        assert!(validate_fields(&fields([("id", json!("x"))])).is_err());
        assert!(validate_fields(&fields([("", json!(1))])).is_err());
        assert!(validate_fields(&fields([("__name__", json!(1))])).is_err());
    }

    #[test]
    fn timestamp_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 15, 0).unwrap();
        assert_eq!(timestamp(at), "2024-03-01T08:15:00.000Z");
    }
}
