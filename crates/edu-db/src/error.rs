//! Error types for edu-db.
//!
//! `DatabaseError` is the store-level error returned by the graph, document
//! and audit stores. `ServiceError` is what the coordinator and lifecycle
//! hooks return to callers.

use edu_core::enums::{AuditAction, StoreKind};
use edu_core::errors::CoreError;
use thiserror::Error;

use crate::retry::is_transient_error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Whether retrying the same statement could succeed (lock contention).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::LibSql(e) => is_transient_error(e),
            _ => false,
        }
    }
}

/// Errors surfaced by the enrollment coordinator and course lifecycle hooks.
///
/// Redundant calls are never errors: "already enrolled" and "not enrolled"
/// are result flags on the response types.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller supplied an unusable identifier or field.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A record the caller explicitly required does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The request collides with existing state (duplicate course name).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A store call failed outright. Nothing was written by this step.
    #[error("{store} store unavailable: {source}")]
    StoreUnavailable {
        store: StoreKind,
        #[source]
        source: DatabaseError,
    },

    /// The edge write committed but the counter update failed. The graph and
    /// the course document now disagree until reconciled.
    #[error(
        "partial write: {action} edge for {user_id} on {course_id} committed, enrolled_count update failed: {source}"
    )]
    PartialWrite {
        user_id: String,
        course_id: String,
        action: AuditAction,
        #[source]
        source: DatabaseError,
    },

    #[error(transparent)]
    Other(anyhow::Error),
}

impl ServiceError {
    pub(crate) fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Wrap a store error with the store it came from. Used with `map_err`.
    pub(crate) fn store(store: StoreKind) -> impl FnOnce(DatabaseError) -> Self {
        move |source| Self::StoreUnavailable { store, source }
    }

    /// Whether this error left the two stores out of agreement.
    #[must_use]
    pub const fn is_partial_write(&self) -> bool {
        matches!(self, Self::PartialWrite { .. })
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::NotFound { entity_type, id } => Self::NotFound {
                entity: entity_type,
                id,
            },
            CoreError::Other(e) => Self::Other(e),
        }
    }
}
