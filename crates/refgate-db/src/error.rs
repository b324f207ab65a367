//! Error types for refgate-db.
//!
//! `DatabaseError` covers raw storage failures. The consistency layer wraps it
//! in one enum per concern so callers can tell a rejected reference apart from
//! an unreachable domain or a failed audit write.

use refgate_core::Domain;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned unusable data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB, bad identifier).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The registry has no handle for this domain.
    #[error("Domain '{0}' is not registered")]
    UnknownDomain(Domain),

    /// Creating the data directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised by the migration engine.
///
/// `SchemaProbe` and `Apply` are caught per unit and recorded as failed
/// outcomes. `StatusStore` is fatal: a run never reports an outcome it could
/// not persist.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The introspection query deciding whether a unit is applied failed.
    #[error("Schema probe for migration '{migration}' failed: {source}")]
    SchemaProbe {
        migration: String,
        source: DatabaseError,
    },

    /// A mutating statement failed after a successful probe.
    #[error("Migration '{migration}' failed on statement `{statement}`: {source}")]
    Apply {
        migration: String,
        statement: String,
        source: DatabaseError,
    },

    /// Reading or writing the status store failed.
    #[error("Status store failure for migration '{migration}': {source}")]
    StatusStore {
        migration: String,
        source: DatabaseError,
    },

    /// The unit was rejected at registration.
    #[error("Invalid migration unit '{name}': {reason}")]
    InvalidUnit { name: String, reason: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Errors from resolving or validating a cross-domain reference.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// No live record exists for the id in its owning domain.
    #[error("Referenced record does not exist: {domain}#{id}")]
    NotFound { domain: Domain, id: i64 },

    /// The live query against the owning domain failed.
    #[error("Cannot resolve references in domain '{domain}': {source}")]
    Unresolvable {
        domain: Domain,
        source: DatabaseError,
    },

    /// More distinct uncached ids than one query can bind.
    #[error("Batch of {requested} ids for domain '{domain}' exceeds the limit of {limit}")]
    BatchTooLarge {
        domain: Domain,
        requested: usize,
        limit: usize,
    },
}

impl ReferenceError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors from the audit logger.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Appending an audit row failed. Always aborts the surrounding mutation.
    #[error("Audit write failed for {table_name}#{record_id}.{field_name}: {source}")]
    Write {
        table_name: String,
        record_id: i64,
        field_name: String,
        source: DatabaseError,
    },

    /// Reading audit history failed.
    #[error("Audit read failed: {0}")]
    Read(DatabaseError),
}

/// Errors from a reference-carrying write.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    /// The field is not declared as a tracked cross-domain reference.
    #[error("{table}.{field} is not a tracked reference field in domain '{domain}'")]
    UntrackedField {
        domain: Domain,
        table: String,
        field: String,
    },

    /// The reference points at a different domain than the field tracks.
    #[error("{table}.{field} references domain '{expected}', got '{actual}'")]
    DomainMismatch {
        table: String,
        field: String,
        expected: Domain,
        actual: Domain,
    },

    /// The entity being updated does not exist in its own domain.
    #[error("Record {table}#{record_id} not found")]
    RecordNotFound { table: String, record_id: i64 },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<libsql::Error> for WriteError {
    fn from(error: libsql::Error) -> Self {
        Self::Database(error.into())
    }
}
