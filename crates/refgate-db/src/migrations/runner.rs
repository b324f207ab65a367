//! Migration runner.
//!
//! Executes registered units against their domains and records every outcome
//! in the [`StatusStore`]. Per-unit failures are isolated: they are logged,
//! recorded as `success = false`, and the batch moves on. A failure to read
//! or write the status store aborts the run.
//!
//! Units targeting the same domain run strictly in registration order.
//! Different domains run concurrently.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use refgate_core::Domain;
use refgate_core::entities::MigrationRecord;
use refgate_core::responses::{MigrationDetail, MigrationOutcome, RunReport};

use crate::error::{DatabaseError, MigrationError};
use crate::migrations::status::StatusStore;
use crate::migrations::unit::MigrationUnit;
use crate::registry::{DomainDb, EngineRegistry};

/// Ordered registry of migration units plus the machinery to run them.
pub struct MigrationRunner {
    registry: Arc<EngineRegistry>,
    status: StatusStore,
    units: Vec<MigrationUnit>,
}

impl MigrationRunner {
    #[must_use]
    pub const fn new(registry: Arc<EngineRegistry>, status: StatusStore) -> Self {
        Self {
            registry,
            status,
            units: Vec::new(),
        }
    }

    /// Append a unit to the ordered registry.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::InvalidUnit` for an empty name, a unit without
    /// statements, a domain the registry does not hold, or a duplicate
    /// `(domain, name)`.
    pub fn register(&mut self, unit: MigrationUnit) -> Result<(), MigrationError> {
        let invalid = |reason: &str| MigrationError::InvalidUnit {
            name: unit.name.clone(),
            reason: reason.to_string(),
        };

        if unit.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if unit.statements.is_empty() {
            return Err(invalid("at least one statement is required"));
        }
        if !self.registry.contains(unit.domain) {
            return Err(invalid(&format!("domain '{}' is not registered", unit.domain)));
        }
        if self
            .units
            .iter()
            .any(|u| u.domain == unit.domain && u.name == unit.name)
        {
            return Err(invalid(&format!("already registered for {}", unit.domain)));
        }

        self.units.push(unit);
        Ok(())
    }

    /// Register several units, stopping at the first rejection.
    ///
    /// # Errors
    ///
    /// See [`Self::register`].
    pub fn register_all(
        &mut self,
        units: impl IntoIterator<Item = MigrationUnit>,
    ) -> Result<(), MigrationError> {
        for unit in units {
            self.register(unit)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn units(&self) -> &[MigrationUnit] {
        &self.units
    }

    #[must_use]
    pub const fn status_store(&self) -> &StatusStore {
        &self.status
    }

    /// Run every registered unit.
    ///
    /// The report has exactly one detail per registered unit, in registration
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::StatusStore` if an outcome could not be read
    /// or persisted.
    pub async fn run_all(&self) -> Result<RunReport, MigrationError> {
        self.run_matching(|_| true).await
    }

    /// Run only the units targeting `domain`.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::StatusStore` if an outcome could not be read
    /// or persisted.
    pub async fn run_domain(&self, domain: Domain) -> Result<RunReport, MigrationError> {
        self.run_matching(|unit| unit.domain == domain).await
    }

    /// Latest recorded outcome per `(domain, migration_name)`.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Database` if the status store cannot be read.
    pub async fn get_status(&self) -> Result<Vec<MigrationRecord>, MigrationError> {
        Ok(self.status.all().await?)
    }

    /// Latest recorded outcome of one unit, if it has ever run.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Database` if the status store cannot be read.
    pub async fn get_record(
        &self,
        domain: Domain,
        name: &str,
    ) -> Result<Option<MigrationRecord>, MigrationError> {
        Ok(self.status.get(domain, name).await?)
    }

    async fn run_matching(
        &self,
        filter: impl Fn(&MigrationUnit) -> bool,
    ) -> Result<RunReport, MigrationError> {
        let mut groups: BTreeMap<Domain, Vec<usize>> = BTreeMap::new();
        for (idx, unit) in self.units.iter().enumerate() {
            if filter(unit) {
                groups.entry(unit.domain).or_default().push(idx);
            }
        }

        tracing::info!(
            units = groups.values().map(Vec::len).sum::<usize>(),
            domains = groups.len(),
            "running migrations"
        );

        let per_domain = try_join_all(groups.into_values().map(|idxs| self.run_group(idxs))).await?;

        let mut indexed: Vec<(usize, MigrationDetail)> = per_domain.into_iter().flatten().collect();
        indexed.sort_by_key(|(idx, _)| *idx);
        let report = RunReport::from_details(indexed.into_iter().map(|(_, d)| d).collect());

        tracing::info!(
            total = report.total_migrations,
            successful = report.successful,
            failed = report.failed,
            "migration run finished"
        );
        Ok(report)
    }

    /// Run one domain's units sequentially.
    async fn run_group(
        &self,
        idxs: Vec<usize>,
    ) -> Result<Vec<(usize, MigrationDetail)>, MigrationError> {
        let mut details = Vec::with_capacity(idxs.len());
        for idx in idxs {
            let detail = self.run_unit(&self.units[idx]).await?;
            details.push((idx, detail));
        }
        Ok(details)
    }

    async fn run_unit(&self, unit: &MigrationUnit) -> Result<MigrationDetail, MigrationError> {
        let status_failure = |source: DatabaseError| MigrationError::StatusStore {
            migration: unit.name.clone(),
            source,
        };

        let previous = self
            .status
            .get(unit.domain, &unit.name)
            .await
            .map_err(status_failure)?;

        let result = if previous.is_some_and(|r| r.success) {
            tracing::info!(
                migration = %unit.name,
                domain = %unit.domain,
                source = "status_store",
                "already exists, skipping"
            );
            Ok((MigrationOutcome::AlreadyApplied, 0))
        } else {
            match self.registry.domain(unit.domain) {
                Ok(db) => apply_unit(db, unit).await,
                Err(source) => Err(MigrationError::SchemaProbe {
                    migration: unit.name.clone(),
                    source,
                }),
            }
        };

        let executed_at = Utc::now();
        let (outcome, statements_executed, error_message) = match result {
            Ok((outcome, executed)) => (outcome, executed, None),
            Err(error) => {
                tracing::warn!(
                    migration = %unit.name,
                    domain = %unit.domain,
                    %error,
                    "migration failed"
                );
                (MigrationOutcome::Failed, 0, Some(error.to_string()))
            }
        };

        let record = MigrationRecord {
            migration_name: unit.name.clone(),
            domain: unit.domain,
            success: outcome.is_success(),
            executed_at,
            error_message: error_message.clone(),
        };
        self.status.record(&record).await.map_err(status_failure)?;

        Ok(MigrationDetail {
            migration_name: unit.name.clone(),
            domain: unit.domain,
            success: record.success,
            outcome,
            statements_executed,
            executed_at,
            error_message,
        })
    }
}

/// Probe, then apply inside one transaction while holding the domain's
/// connection.
async fn apply_unit(
    db: &DomainDb,
    unit: &MigrationUnit,
) -> Result<(MigrationOutcome, u32), MigrationError> {
    let conn = db.conn().await;

    let applied = unit
        .probe
        .is_applied(&conn)
        .await
        .map_err(|source| MigrationError::SchemaProbe {
            migration: unit.name.clone(),
            source,
        })?;
    if applied {
        tracing::info!(
            migration = %unit.name,
            domain = %unit.domain,
            source = "probe",
            probe = %unit.probe,
            "already exists, skipping"
        );
        return Ok((MigrationOutcome::AlreadyApplied, 0));
    }

    let apply_failure = |statement: &str, source: DatabaseError| MigrationError::Apply {
        migration: unit.name.clone(),
        statement: statement.to_string(),
        source,
    };

    let tx = conn
        .transaction()
        .await
        .map_err(|e| apply_failure("BEGIN", e.into()))?;

    let mut executed = 0u32;
    for statement in &unit.statements {
        tracing::debug!(migration = %unit.name, statement = %statement, "executing");
        if let Err(e) = tx.execute(statement, ()).await {
            if let Err(rollback_error) = tx.rollback().await {
                tracing::warn!(migration = %unit.name, %rollback_error, "rollback failed");
            }
            return Err(apply_failure(statement, e.into()));
        }
        executed += 1;
    }

    tx.commit()
        .await
        .map_err(|e| apply_failure("COMMIT", e.into()))?;

    tracing::info!(
        migration = %unit.name,
        domain = %unit.domain,
        statements = executed,
        "applied"
    );
    Ok((MigrationOutcome::Applied, executed))
}
