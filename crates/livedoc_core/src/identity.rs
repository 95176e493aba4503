//! Current-user identity as supplied by the identity provider.

use crate::document::Fields;
use crate::query::Filter;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A student.
    Student,
    /// A teacher.
    Teacher,
}

/// The signed-in user, read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User identifier.
    pub uid: String,
    /// Display name.
    pub display_name: String,
    /// Role.
    pub role: Role,
}

impl Identity {
    /// Creates an identity.
    pub fn new(uid: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.into(),
            role,
        }
    }

    /// `field == <uid>`, e.g. "documents where studentId equals me".
    pub fn owns(&self, field: impl Into<String>) -> Filter {
        Filter::eq(field, self.uid.as_str())
    }

    /// Stamps authorship onto a write payload.
    ///
    /// Sets `id_field` to the user id and `name_field` to the display name,
    /// overwriting whatever the payload carried.
    pub fn stamp(&self, fields: &mut Fields, id_field: &str, name_field: &str) {
        fields.insert(id_field.to_string(), Value::String(self.uid.clone()));
        fields.insert(
            name_field.to_string(),
            Value::String(self.display_name.clone()),
        );
    }
}

/// Supplies the current user, if anyone is signed in.
pub trait IdentityProvider: Send + Sync {
    /// Returns the signed-in user.
    fn current(&self) -> Option<Identity>;
}

/// An identity provider with a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<Identity>);

impl StaticIdentity {
    /// A provider that always returns `identity`.
    pub fn signed_in(identity: Identity) -> Self {
        Self(Some(identity))
    }

    /// A provider with nobody signed in.
    pub fn signed_out() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current(&self) -> Option<Identity> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{fields, Document};
    use serde_json::json;

    #[test]
    fn owns_builds_equality_filter() {
        let me = Identity::new("u1", "Ivan Petrov", Role::Student);
        let mine = Document::new("g1", fields([("studentId", json!("u1"))]));
        let theirs = Document::new("g2", fields([("studentId", json!("u2"))]));
        assert!(me.owns("studentId").matches(&mine));
        assert!(!me.owns("studentId").matches(&theirs));
    }

    #[test]
    fn stamp_overwrites_author_fields() {
        let me = Identity::new("t1", "Ms. Ivanova", Role::Teacher);
        let mut payload = fields([("title", json!("Exam")), ("teacherId", json!("forged"))]);
        me.stamp(&mut payload, "teacherId", "teacherName");
        assert_eq!(payload["teacherId"], json!("t1"));
        assert_eq!(payload["teacherName"], json!("Ms. Ivanova"));
    }

    #[test]
    fn static_provider() {
        assert!(StaticIdentity::signed_out().current().is_none());
        let me = Identity::new("u1", "Ivan", Role::Student);
        assert_eq!(StaticIdentity::signed_in(me.clone()).current(), Some(me));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::Teacher).unwrap(), json!("teacher"));
    }
}
