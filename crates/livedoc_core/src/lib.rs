//! # livedoc core
//!
//! Data model shared by the livedoc store and bindings.
//!
//! This crate provides:
//! - Documents, field maps and store-assigned identifiers
//! - Constraint-sets (`Query`) and their evaluation
//! - The CBOR wire format of document bodies
//! - The error taxonomy (`StoreError`)
//! - Typed records for the school collections
//! - The identity seen by constraint construction and authorship stamping
//! - Derived views (grouping, averages, search, partitions)

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
mod document;
mod error;
mod identity;
mod query;
pub mod record;
pub mod views;

pub use document::{
    fields, timestamp, validate_fields, Document, DocumentId, Fields, ID_FIELD,
};
pub use error::{ErrorKind, StoreError, StoreResult};
pub use identity::{Identity, IdentityProvider, Role, StaticIdentity};
pub use query::{Direction, Filter, FilterOp, OrderBy, Query};
pub use record::{
    Absence, AbsenceStatus, Announcement, Grade, Homework, Message, Record, Submission,
    SubmissionStatus, TimetableSlot, UserProfile, Weekday,
};

/// Re-export of the JSON value type used for field values.
pub use serde_json::Value;
