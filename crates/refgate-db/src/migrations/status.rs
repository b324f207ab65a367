//! Persisted migration outcomes.
//!
//! One row per `(domain, migration_name)` holding the latest attempt. The
//! table lives in a single configured domain; rows are upserted, never
//! deleted.

use std::sync::Arc;

use refgate_core::Domain;
use refgate_core::entities::MigrationRecord;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime};
use crate::registry::EngineRegistry;

const CREATE_STATUS_TABLE: &str = "CREATE TABLE IF NOT EXISTS migration_status (
    domain TEXT NOT NULL,
    migration_name TEXT NOT NULL,
    success INTEGER NOT NULL,
    executed_at TEXT NOT NULL,
    error_message TEXT,
    PRIMARY KEY (domain, migration_name)
)";

const SELECT_COLS: &str = "migration_name, domain, success, executed_at, error_message";

fn row_to_record(row: &libsql::Row) -> Result<MigrationRecord, DatabaseError> {
    let domain: String = row.get(1)?;
    Ok(MigrationRecord {
        migration_name: row.get(0)?,
        domain: domain
            .parse()
            .map_err(|e| DatabaseError::InvalidState(format!("migration_status.domain: {e}")))?,
        success: row.get::<i64>(2)? != 0,
        executed_at: parse_datetime(&row.get::<String>(3)?)?,
        error_message: get_opt_string(row, 4)?,
    })
}

/// Reads and writes `migration_status` in the configured domain.
pub struct StatusStore {
    registry: Arc<EngineRegistry>,
    domain: Domain,
}

impl StatusStore {
    /// Bind to `domain` and create the status table if missing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the domain is not registered or the table
    /// cannot be created.
    pub async fn open(registry: Arc<EngineRegistry>, domain: Domain) -> Result<Self, DatabaseError> {
        registry
            .domain(domain)?
            .conn()
            .await
            .execute(CREATE_STATUS_TABLE, ())
            .await?;
        Ok(Self { registry, domain })
    }

    /// Domain hosting the status table.
    #[must_use]
    pub const fn domain(&self) -> Domain {
        self.domain
    }

    /// Insert or overwrite the outcome for `(record.domain, record.migration_name)`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the upsert fails.
    pub async fn record(&self, record: &MigrationRecord) -> Result<(), DatabaseError> {
        let db = self.registry.domain(self.domain)?;
        db.conn()
            .await
            .execute(
                "INSERT INTO migration_status (domain, migration_name, success, executed_at, error_message)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (domain, migration_name) DO UPDATE SET
                     success = excluded.success,
                     executed_at = excluded.executed_at,
                     error_message = excluded.error_message",
                libsql::params![
                    record.domain.as_str(),
                    record.migration_name.as_str(),
                    i64::from(record.success),
                    record.executed_at.to_rfc3339(),
                    record.error_message.as_deref()
                ],
            )
            .await?;
        Ok(())
    }

    /// Latest outcome for one migration, if it has ever run.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get(
        &self,
        domain: Domain,
        migration_name: &str,
    ) -> Result<Option<MigrationRecord>, DatabaseError> {
        let db = self.registry.domain(self.domain)?;
        let conn = db.conn().await;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM migration_status
                     WHERE domain = ?1 AND migration_name = ?2"
                ),
                [domain.as_str(), migration_name],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    /// Every recorded outcome, ordered by domain then name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn all(&self) -> Result<Vec<MigrationRecord>, DatabaseError> {
        let db = self.registry.domain(self.domain)?;
        let conn = db.conn().await;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM migration_status
                     ORDER BY domain, migration_name"
                ),
                (),
            )
            .await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    async fn store() -> StatusStore {
        let registry = Arc::new(EngineRegistry::in_memory().await.unwrap());
        StatusStore::open(registry, Domain::Settings).await.unwrap()
    }

    fn record(name: &str, success: bool) -> MigrationRecord {
        MigrationRecord {
            migration_name: name.to_string(),
            domain: Domain::Units,
            success,
            executed_at: Utc::now(),
            error_message: (!success).then(|| "no such table: units".to_string()),
        }
    }

    #[tokio::test]
    async fn upsert_keeps_latest_outcome() {
        let store = store().await;
        store.record(&record("create_units", false)).await.unwrap();
        store.record(&record("create_units", true)).await.unwrap();

        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].success);
        assert_eq!(all[0].error_message, None);
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = store().await;
        let got = store.get(Domain::Units, "create_units").await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn get_roundtrips_error_text() {
        let store = store().await;
        store.record(&record("create_units", false)).await.unwrap();
        let got = store
            .get(Domain::Units, "create_units")
            .await
            .unwrap()
            .unwrap();
        assert!(!got.success);
        assert_eq!(got.error_message.as_deref(), Some("no such table: units"));
    }

    #[tokio::test]
    async fn open_is_idempotent() {
        let registry = Arc::new(EngineRegistry::in_memory().await.unwrap());
        StatusStore::open(Arc::clone(&registry), Domain::Settings)
            .await
            .unwrap();
        StatusStore::open(registry, Domain::Settings).await.unwrap();
    }
}
