//! Reference audit trail.
//!
//! Append-only rows recording every accepted change to a cross-domain
//! reference field. The table lives in the owning domain of the mutated
//! entity so the audit row shares the mutation's transaction: if the append
//! fails, the mutation rolls back with it.

use std::sync::Arc;

use chrono::{SecondsFormat, SubsecRound, Utc};
use refgate_core::Domain;
use refgate_core::entities::{AuditRecord, NewAuditRecord};

use crate::error::{AuditError, DatabaseError};
use crate::helpers::{generate_id, get_opt_string, parse_datetime};
use crate::migrations::unit::MigrationUnit;
use crate::registry::EngineRegistry;

/// ID prefix for audit rows.
pub const PREFIX_AUDIT: &str = "aud";

const SELECT_COLS: &str = "id, table_name, record_id, field_name, old_reference_id, \
     new_reference_id, changed_by, changed_at, change_reason";

/// Units creating `reference_audit` and its indexes in `domain`.
#[must_use]
pub fn migration_units(domain: Domain) -> Vec<MigrationUnit> {
    vec![
        MigrationUnit::create_table(
            "create_reference_audit",
            domain,
            "reference_audit",
            "CREATE TABLE reference_audit (
                id TEXT PRIMARY KEY,
                table_name TEXT NOT NULL,
                record_id INTEGER NOT NULL,
                field_name TEXT NOT NULL,
                old_reference_id INTEGER,
                new_reference_id INTEGER,
                changed_by TEXT NOT NULL,
                changed_at TEXT NOT NULL,
                change_reason TEXT
            )",
        ),
        MigrationUnit::create_index(
            "create_idx_reference_audit_record",
            domain,
            "idx_reference_audit_record",
            "reference_audit",
            "table_name, record_id",
        ),
        MigrationUnit::create_index(
            "create_idx_reference_audit_changed_at",
            domain,
            "idx_reference_audit_changed_at",
            "reference_audit",
            "changed_at",
        ),
    ]
}

fn row_to_record(row: &libsql::Row) -> Result<AuditRecord, DatabaseError> {
    Ok(AuditRecord {
        id: row.get(0)?,
        table_name: row.get(1)?,
        record_id: row.get(2)?,
        field_name: row.get(3)?,
        old_reference_id: row.get::<Option<i64>>(4)?,
        new_reference_id: row.get::<Option<i64>>(5)?,
        changed_by: row.get(6)?,
        changed_at: parse_datetime(&row.get::<String>(7)?)?,
        change_reason: get_opt_string(row, 8)?,
    })
}

async fn insert(
    conn: &libsql::Connection,
    entry: &NewAuditRecord,
) -> Result<AuditRecord, DatabaseError> {
    let record = AuditRecord {
        id: generate_id(conn, PREFIX_AUDIT).await?,
        table_name: entry.table_name.clone(),
        record_id: entry.record_id,
        field_name: entry.field_name.clone(),
        old_reference_id: entry.old_reference_id,
        new_reference_id: entry.new_reference_id,
        changed_by: entry.changed_by.clone(),
        changed_at: Utc::now().trunc_subsecs(6),
        change_reason: entry.change_reason.clone(),
    };

    conn.execute(
        &format!(
            "INSERT INTO reference_audit ({SELECT_COLS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ),
        libsql::params![
            record.id.as_str(),
            record.table_name.as_str(),
            record.record_id,
            record.field_name.as_str(),
            record.old_reference_id,
            record.new_reference_id,
            record.changed_by.as_str(),
            record.changed_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            record.change_reason.as_deref()
        ],
    )
    .await?;
    Ok(record)
}

/// Appends and reads `reference_audit` rows.
#[derive(Clone)]
pub struct AuditLogger {
    registry: Arc<EngineRegistry>,
}

impl AuditLogger {
    #[must_use]
    pub const fn new(registry: Arc<EngineRegistry>) -> Self {
        Self { registry }
    }

    /// Append inside the caller's open transaction.
    ///
    /// The caller commits or rolls back; on error it must roll back so the
    /// reference change never lands without its audit row.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Write` if the insert fails.
    pub async fn append_in(
        &self,
        conn: &libsql::Connection,
        entry: &NewAuditRecord,
    ) -> Result<AuditRecord, AuditError> {
        if entry.changed_by.trim().is_empty() {
            return Err(write_error(
                entry,
                DatabaseError::InvalidState("changed_by must not be empty".into()),
            ));
        }
        insert(conn, entry).await.map_err(|e| write_error(entry, e))
    }

    /// Append in its own transaction on `domain`.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Write` if the domain is unknown or any step of
    /// the transaction fails.
    pub async fn record(
        &self,
        domain: Domain,
        entry: &NewAuditRecord,
    ) -> Result<AuditRecord, AuditError> {
        let db = self
            .registry
            .domain(domain)
            .map_err(|e| write_error(entry, e))?;
        let conn = db.conn().await;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| write_error(entry, e.into()))?;
        match self.append_in(&tx, entry).await {
            Ok(record) => {
                tx.commit().await.map_err(|e| write_error(entry, e.into()))?;
                Ok(record)
            }
            Err(error) => {
                if let Err(rollback_error) = tx.rollback().await {
                    tracing::warn!(%rollback_error, "audit rollback failed");
                }
                Err(error)
            }
        }
    }

    /// Full history of one entity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Read` if the query fails.
    pub async fn history(
        &self,
        domain: Domain,
        table_name: &str,
        record_id: i64,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        self.query(
            domain,
            &format!(
                "SELECT {SELECT_COLS} FROM reference_audit
                 WHERE table_name = ?1 AND record_id = ?2
                 ORDER BY changed_at ASC, rowid ASC"
            ),
            libsql::params![table_name, record_id],
        )
        .await
    }

    /// Most recent rows across all entities of `domain`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Read` if the query fails.
    pub async fn recent(&self, domain: Domain, limit: u32) -> Result<Vec<AuditRecord>, AuditError> {
        self.query(
            domain,
            &format!(
                "SELECT {SELECT_COLS} FROM reference_audit
                 ORDER BY changed_at DESC, rowid DESC LIMIT ?1"
            ),
            libsql::params![i64::from(limit)],
        )
        .await
    }

    async fn query(
        &self,
        domain: Domain,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        let read = async {
            let db = self.registry.domain(domain)?;
            let conn = db.conn().await;
            let mut rows = conn.query(sql, params).await?;
            let mut records = Vec::new();
            while let Some(row) = rows.next().await? {
                records.push(row_to_record(&row)?);
            }
            Ok::<_, DatabaseError>(records)
        };
        read.await.map_err(AuditError::Read)
    }
}

fn write_error(entry: &NewAuditRecord, source: DatabaseError) -> AuditError {
    AuditError::Write {
        table_name: entry.table_name.clone(),
        record_id: entry.record_id,
        field_name: entry.field_name.clone(),
        source,
    }
}
