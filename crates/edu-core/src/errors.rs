//! Cross-cutting error types for the edu crates.
//!
//! Store-level and coordinator-level errors (`DatabaseError`, `ServiceError`)
//! live in `edu-db`. A unified error is deferred to `edu-cli` where all crate
//! errors converge into `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any edu crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
