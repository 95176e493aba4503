//! JSON seed data.
//!
//! A fixture is an object mapping collection names to arrays of documents:
//!
//! ```json
//! {
//!   "grades": [
//!     { "id": "g1", "studentId": "u1", "subject": "Math", "value": 5.5 },
//!     { "studentId": "u1", "subject": "Math", "value": 4.0 }
//!   ]
//! }
//! ```
//!
//! The `id` key is optional; documents without one get a generated id.

use livedoc_core::{DocumentId, Fields, StoreError, StoreResult, ID_FIELD};
use serde_json::Value;

/// One document of a fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureDocument {
    /// Target collection.
    pub collection: String,
    /// Explicit id, if the fixture gave one.
    pub id: Option<DocumentId>,
    /// Field values.
    pub fields: Fields,
}

/// Parses fixture JSON text.
pub fn parse_fixture(text: &str) -> StoreResult<Vec<FixtureDocument>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| StoreError::fixture(format!("invalid JSON: {e}")))?;
    fixture_documents(value)
}

/// Flattens a parsed fixture into documents, collection by collection.
pub fn fixture_documents(value: Value) -> StoreResult<Vec<FixtureDocument>> {
    let Value::Object(collections) = value else {
        return Err(StoreError::fixture(
            "top level must be an object of collections",
        ));
    };

    let mut out = Vec::new();
    for (collection, docs) in collections {
        let Value::Array(docs) = docs else {
            return Err(StoreError::fixture(format!(
                "collection `{collection}` must be an array"
            )));
        };
        for (index, doc) in docs.into_iter().enumerate() {
            let Value::Object(map) = doc else {
                return Err(StoreError::fixture(format!(
                    "{collection}[{index}] must be an object"
                )));
            };
            let mut fields: Fields = map.into_iter().collect();
            let id = match fields.remove(ID_FIELD) {
                None => None,
                Some(Value::String(id)) if !id.is_empty() => Some(DocumentId::from(id)),
                Some(other) => {
                    return Err(StoreError::fixture(format!(
                        "{collection}[{index}].id must be a non-empty string, got {other}"
                    )))
                }
            };
            out.push(FixtureDocument {
                collection: collection.clone(),
                id,
                fields,
            });
        }
    }
    Ok(out)
}
