//! # refgate-db
//!
//! Cross-database consistency layer over per-domain libSQL databases.
//!
//! Each [`Domain`] owns an independent database; there are no native foreign
//! keys between them and no distributed transactions. This crate supplies
//! what makes that workable:
//!
//! - [`registry`]: one storage handle per domain, opened once at start-up
//! - [`migrations`]: idempotent, status-tracked schema evolution
//! - [`refs`]: TTL reference cache, write-boundary validator, audited writer
//! - [`audit`]: append-only trail of reference changes
//!
//! [`Consistency`] wires all of it from a [`RefgateConfig`].

pub mod audit;
pub mod error;
pub mod helpers;
pub mod migrations;
pub mod refs;
pub mod registry;

use std::sync::Arc;

use refgate_config::{DatabasesConfig, RefgateConfig};
use refgate_core::Domain;

use audit::AuditLogger;
use error::MigrationError;
use migrations::{MigrationRunner, StatusStore, catalog};
use refs::{ReferenceCache, ReferenceValidator, ReferenceWriter};
use registry::EngineRegistry;

/// Every component of the consistency layer, sharing one registry.
pub struct Consistency {
    registry: Arc<EngineRegistry>,
    runner: MigrationRunner,
    validator: ReferenceValidator,
    audit: AuditLogger,
    writer: ReferenceWriter,
}

impl Consistency {
    /// Open every enabled domain and register the standard migrations for
    /// them. Migrations are registered, not run.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError` if a domain cannot be opened, the status
    /// table cannot be created, or a standard unit is rejected.
    pub async fn open(config: &RefgateConfig) -> Result<Self, MigrationError> {
        let registry = Arc::new(EngineRegistry::open(&config.databases).await?);
        let cache = ReferenceCache::from_config(Arc::clone(&registry), &config.cache);
        Self::assemble(registry, config.migrations.status_domain, cache).await
    }

    /// All domains in memory, default cache TTL, status in `settings`.
    ///
    /// # Errors
    ///
    /// See [`Self::open`].
    pub async fn in_memory() -> Result<Self, MigrationError> {
        let config = RefgateConfig {
            databases: DatabasesConfig::in_memory(),
            ..RefgateConfig::default()
        };
        Self::open(&config).await
    }

    async fn assemble(
        registry: Arc<EngineRegistry>,
        status_domain: Domain,
        cache: ReferenceCache,
    ) -> Result<Self, MigrationError> {
        let status = StatusStore::open(Arc::clone(&registry), status_domain).await?;
        let enabled: Vec<Domain> = registry.domains().collect();
        let mut runner = MigrationRunner::new(Arc::clone(&registry), status);
        runner.register_all(catalog::standard_units_for(&enabled))?;

        let validator = ReferenceValidator::new(Arc::new(cache));
        let audit = AuditLogger::new(Arc::clone(&registry));
        let writer = ReferenceWriter::new(Arc::clone(&registry), validator.clone(), audit.clone());

        Ok(Self {
            registry,
            runner,
            validator,
            audit,
            writer,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn runner(&self) -> &MigrationRunner {
        &self.runner
    }

    /// Mutable access for registering extra units before a run.
    pub const fn runner_mut(&mut self) -> &mut MigrationRunner {
        &mut self.runner
    }

    #[must_use]
    pub fn cache(&self) -> &ReferenceCache {
        self.validator.cache()
    }

    #[must_use]
    pub const fn validator(&self) -> &ReferenceValidator {
        &self.validator
    }

    #[must_use]
    pub const fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    #[must_use]
    pub const fn writer(&self) -> &ReferenceWriter {
        &self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_registers_standard_units() {
        let layer = Consistency::in_memory().await.unwrap();
        assert_eq!(
            layer.runner().units().len(),
            catalog::standard_units().len()
        );
        assert_eq!(layer.runner().status_store().domain(), Domain::Settings);
    }

    #[tokio::test]
    async fn restricted_domains_only_get_their_units() {
        let config = RefgateConfig {
            databases: DatabasesConfig {
                domains: vec![Domain::Settings, Domain::Units],
                ..DatabasesConfig::in_memory()
            },
            ..RefgateConfig::default()
        };
        let layer = Consistency::open(&config).await.unwrap();
        assert!(
            layer
                .runner()
                .units()
                .iter()
                .all(|u| matches!(u.domain, Domain::Settings | Domain::Units))
        );
    }

    #[tokio::test]
    async fn standard_schema_is_idempotent() {
        let layer = Consistency::in_memory().await.unwrap();
        let first = layer.runner().run_all().await.unwrap();
        assert_eq!(first.failed, 0, "{:?}", first.details);

        let second = layer.runner().run_all().await.unwrap();
        assert_eq!(second.failed, 0);
        assert_eq!(second.statements_executed(), 0);
    }
}
