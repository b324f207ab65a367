//! Reference-carrying writes with their audit rows.
//!
//! Protocol for every tracked field change:
//! 1. Validate the new reference against its owning domain
//! 2. Take the entity domain's connection and begin a transaction
//! 3. Read the current value, write the new one
//! 4. Append the audit row inside the same transaction
//! 5. Commit, or roll back everything if any step failed

use std::sync::Arc;

use refgate_core::entities::{AuditRecord, NewAuditRecord};
use refgate_core::{Domain, Reference};

use crate::audit::AuditLogger;
use crate::error::WriteError;
use crate::helpers::{ensure_identifier, placeholders};
use crate::migrations::catalog::{self, TrackedField};
use crate::refs::validator::ReferenceValidator;
use crate::registry::EngineRegistry;

/// Change one tracked reference field of an existing row.
#[derive(Debug, Clone)]
pub struct ReferenceUpdate<'a> {
    pub table: &'a str,
    pub record_id: i64,
    pub field: &'a str,
    /// `None` clears the reference.
    pub new: Option<Reference>,
    pub actor: &'a str,
    pub reason: Option<&'a str>,
}

/// Insert a row whose tracked reference columns are validated and audited.
#[derive(Debug, Clone)]
pub struct NewEntity<'a> {
    pub table: &'a str,
    /// Plain (non-reference) columns.
    pub columns: Vec<(&'a str, libsql::Value)>,
    pub references: Vec<(&'a str, Option<Reference>)>,
    pub actor: &'a str,
    pub reason: Option<&'a str>,
}

/// Result of [`ReferenceWriter::insert_with_references`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedEntity {
    pub id: i64,
    pub audit: Vec<AuditRecord>,
}

pub struct ReferenceWriter {
    registry: Arc<EngineRegistry>,
    validator: ReferenceValidator,
    audit: AuditLogger,
}

impl ReferenceWriter {
    /// Writer over the tracked fields declared in [`catalog::TRACKED_FIELDS`].
    #[must_use]
    pub fn new(
        registry: Arc<EngineRegistry>,
        validator: ReferenceValidator,
        audit: AuditLogger,
    ) -> Self {
        Self {
            registry,
            validator,
            audit,
        }
    }

    /// Point a tracked field at a new reference (or clear it).
    ///
    /// Returns the audit row, or `None` when the value was already equal and
    /// nothing was written.
    ///
    /// # Errors
    ///
    /// `WriteError::Reference` if the new reference does not exist or cannot
    /// be checked, `WriteError::Audit` if the audit append fails (the update is
    /// rolled back), `WriteError::RecordNotFound` if the row is missing.
    pub async fn set_reference(
        &self,
        owner: Domain,
        update: &ReferenceUpdate<'_>,
    ) -> Result<Option<AuditRecord>, WriteError> {
        let field = tracked_field(owner, update.table, update.field, update.new.as_ref())?;
        self.validator.validate_optional(update.new.as_ref()).await?;

        let db = self.registry.domain(owner)?;
        let conn = db.conn().await;
        let tx = conn.transaction().await?;
        let result = self.update_in(&tx, field, update).await;
        let outcome = finish(tx, result).await;
        drop(conn);

        if outcome.is_ok() && owner.master_source().table == update.table {
            self.validator.cache().invalidate(owner, update.record_id);
        }
        if let Ok(Some(record)) = &outcome {
            tracing::info!(
                %owner,
                table = update.table,
                record_id = update.record_id,
                field = update.field,
                old = ?record.old_reference_id,
                new = ?record.new_reference_id,
                actor = update.actor,
                "reference changed"
            );
        }
        outcome
    }

    /// Insert a row and audit each non-null reference it carries.
    ///
    /// # Errors
    ///
    /// `WriteError::Reference` if any reference is rejected (nothing is
    /// written), `WriteError::Audit` if an audit append fails (the insert is
    /// rolled back).
    pub async fn insert_with_references(
        &self,
        owner: Domain,
        entity: &NewEntity<'_>,
    ) -> Result<InsertedEntity, WriteError> {
        ensure_identifier(entity.table)?;
        for (column, _) in &entity.columns {
            ensure_identifier(column)?;
        }
        for (field, reference) in &entity.references {
            tracked_field(owner, entity.table, field, reference.as_ref())?;
            self.validator.validate_optional(reference.as_ref()).await?;
        }

        let db = self.registry.domain(owner)?;
        let conn = db.conn().await;
        let tx = conn.transaction().await?;
        let result = self.insert_in(&tx, entity).await;
        let inserted = finish(tx, result).await?;
        drop(conn);

        tracing::info!(
            %owner,
            table = entity.table,
            id = inserted.id,
            references = inserted.audit.len(),
            actor = entity.actor,
            "entity created"
        );
        Ok(inserted)
    }

    async fn update_in(
        &self,
        conn: &libsql::Connection,
        field: &TrackedField,
        update: &ReferenceUpdate<'_>,
    ) -> Result<Option<AuditRecord>, WriteError> {
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM {} WHERE id = ?1", field.field, field.table),
                [update.record_id],
            )
            .await?;
        let row = rows.next().await?.ok_or_else(|| WriteError::RecordNotFound {
            table: field.table.to_string(),
            record_id: update.record_id,
        })?;
        let old: Option<i64> = row.get(0)?;
        let new = update.new.map(|r| r.id);
        if old == new {
            return Ok(None);
        }

        conn.execute(
            &format!("UPDATE {} SET {} = ?1 WHERE id = ?2", field.table, field.field),
            libsql::params![new, update.record_id],
        )
        .await?;

        let record = self
            .audit
            .append_in(
                conn,
                &NewAuditRecord {
                    table_name: field.table.to_string(),
                    record_id: update.record_id,
                    field_name: field.field.to_string(),
                    old_reference_id: old,
                    new_reference_id: new,
                    changed_by: update.actor.to_string(),
                    change_reason: update.reason.map(String::from),
                },
            )
            .await?;
        Ok(Some(record))
    }

    async fn insert_in(
        &self,
        conn: &libsql::Connection,
        entity: &NewEntity<'_>,
    ) -> Result<InsertedEntity, WriteError> {
        let mut names: Vec<&str> = entity.columns.iter().map(|(c, _)| *c).collect();
        let mut values: Vec<libsql::Value> =
            entity.columns.iter().map(|(_, v)| v.clone()).collect();
        for (field, reference) in &entity.references {
            names.push(*field);
            values.push(reference.map_or(libsql::Value::Null, |r| libsql::Value::Integer(r.id)));
        }

        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({})",
                entity.table,
                names.join(", "),
                placeholders(values.len())
            ),
            libsql::params_from_iter(values),
        )
        .await?;
        let id = conn.last_insert_rowid();

        let mut audit = Vec::new();
        for (field, reference) in &entity.references {
            let Some(reference) = reference else { continue };
            let record = self
                .audit
                .append_in(
                    conn,
                    &NewAuditRecord {
                        table_name: entity.table.to_string(),
                        record_id: id,
                        field_name: (*field).to_string(),
                        old_reference_id: None,
                        new_reference_id: Some(reference.id),
                        changed_by: entity.actor.to_string(),
                        change_reason: entity.reason.map(String::from),
                    },
                )
                .await?;
            audit.push(record);
        }
        Ok(InsertedEntity { id, audit })
    }
}

/// Resolve the declared field and check the reference points at its target.
fn tracked_field(
    owner: Domain,
    table: &str,
    field: &str,
    reference: Option<&Reference>,
) -> Result<&'static TrackedField, WriteError> {
    let tracked =
        catalog::tracked_field(owner, table, field).ok_or_else(|| WriteError::UntrackedField {
            domain: owner,
            table: table.to_string(),
            field: field.to_string(),
        })?;
    if let Some(reference) = reference
        && reference.domain != tracked.target
    {
        return Err(WriteError::DomainMismatch {
            table: table.to_string(),
            field: field.to_string(),
            expected: tracked.target,
            actual: reference.domain,
        });
    }
    Ok(tracked)
}

/// Commit on success, roll back on failure.
async fn finish<T>(
    tx: libsql::Transaction,
    result: Result<T, WriteError>,
) -> Result<T, WriteError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback().await {
                tracing::warn!(%rollback_error, "rollback failed");
            }
            Err(error)
        }
    }
}
