//! Typed records.
//!
//! Documents travel untyped; each collection has a [`Record`] type that a
//! document is decoded into at the boundary. Decoding goes through serde on
//! the flattened `{"id": ..., <fields>}` view of the document, so a record
//! only needs `Serialize + Deserialize` and a collection name.
//!
//! # Example
//!
//! ```rust,ignore
//! use livedoc_core::{Grade, Record};
//!
//! let grades: Vec<Grade> = snapshot
//!     .iter()
//!     .map(Grade::from_document)
//!     .collect::<Result<_, _>>()?;
//! ```

mod school;

pub use school::{
    Absence, AbsenceStatus, Announcement, Grade, Homework, Message, Submission,
    SubmissionStatus, TimetableSlot, UserProfile, Weekday,
};

use crate::document::{Document, DocumentId, Fields, ID_FIELD};
use crate::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A schema for the documents of one collection.
pub trait Record: Serialize + DeserializeOwned {
    /// Name of the collection holding these records.
    const COLLECTION: &'static str;

    /// Returns the record's document id (empty before the first write).
    fn id(&self) -> &DocumentId;

    /// Decodes and validates a document.
    fn from_document(doc: &Document) -> StoreResult<Self> {
        let value = serde_json::to_value(doc).map_err(|e| malformed::<Self>(&doc.id, e))?;
        serde_json::from_value(value).map_err(|e| malformed::<Self>(&doc.id, e))
    }

    /// Encodes the record as a write payload, without the id.
    fn to_fields(&self) -> StoreResult<Fields> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map
                .into_iter()
                .filter(|(name, _)| name != ID_FIELD)
                .collect()),
            Ok(other) => Err(StoreError::validation(format!(
                "{} record encoded to a non-object: {other}",
                Self::COLLECTION
            ))),
            Err(e) => Err(StoreError::validation(format!(
                "{} record could not be encoded: {e}",
                Self::COLLECTION
            ))),
        }
    }
}

fn malformed<R: Record>(id: &DocumentId, err: serde_json::Error) -> StoreError {
    StoreError::validation(format!(
        "malformed {} document {id}: {err}",
        R::COLLECTION
    ))
}

/// Decodes every document of a snapshot, failing on the first malformed one.
pub fn decode_all<R: Record>(docs: &[Document]) -> StoreResult<Vec<R>> {
    docs.iter().map(R::from_document).collect()
}
