//! Cross-cutting error types for refgate.
//!
//! Storage-specific errors (`DatabaseError`, `MigrationError`,
//! `ReferenceError`, `AuditError`) live in `refgate-db`. A unified error is
//! deferred to `refgate-cli` where all crate errors converge.

use thiserror::Error;

/// Errors that can be raised by any refgate crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed validation (format, range, unknown enum value).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
