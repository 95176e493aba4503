//! Error types for livedoc.

use thiserror::Error;

/// Result type for store and binding operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Coarse classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transient network or subscription failure.
    Connection,
    /// Rejected by store-side access rules.
    Permission,
    /// Malformed write payload or constraint.
    Validation,
    /// Mutation target does not exist.
    NotFound,
    /// Wire payload could not be encoded or decoded.
    Codec,
    /// Seed data could not be loaded.
    Fixture,
}

/// Errors surfaced by the document store and the bindings built on it.
///
/// The error is `Clone` so a binding that was terminated by a subscription
/// failure can keep the error and still hand copies to observers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or dropped the subscription.
    #[error("connection error: {message}")]
    Connection {
        /// Description of the failure.
        message: String,
    },

    /// Access rules rejected the operation.
    #[error("permission denied on collection {collection}: {message}")]
    PermissionDenied {
        /// Collection the operation targeted.
        collection: String,
        /// Description of the rejection.
        message: String,
    },

    /// Payload or constraint failed validation.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the problem.
        message: String,
    },

    /// The document targeted by a mutation does not exist.
    #[error("document {id} not found in collection {collection}")]
    NotFound {
        /// Collection searched.
        collection: String,
        /// Identifier that was not found.
        id: String,
    },

    /// CBOR encoding or decoding failed.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the codec failure.
        message: String,
    },

    /// Fixture data could not be read or parsed.
    #[error("fixture error: {message}")]
    Fixture {
        /// Description of the fixture problem.
        message: String,
    },
}

impl StoreError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a permission error.
    pub fn permission_denied(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates a fixture error.
    pub fn fixture(message: impl Into<String>) -> Self {
        Self::Fixture {
            message: message.into(),
        }
    }

    /// Returns the taxonomy entry of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Connection { .. } => ErrorKind::Connection,
            StoreError::PermissionDenied { .. } => ErrorKind::Permission,
            StoreError::Validation { .. } => ErrorKind::Validation,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Codec { .. } => ErrorKind::Codec,
            StoreError::Fixture { .. } => ErrorKind::Fixture,
        }
    }
}
