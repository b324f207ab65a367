//! Database engine registry.
//!
//! One [`DomainDb`] per enabled [`Domain`], opened once at process start and
//! shared (behind an `Arc`) with every component that needs storage access.
//! There is no global state: components receive the registry explicitly.
//!
//! Each handle owns exactly one connection, so any statement issued through
//! it touches a single domain. Cross-domain relationships go through the
//! reference cache and validator instead.
//!
//! The connection sits behind an async mutex. Transactions are scoped to the
//! connection, so readers take the same guard as writers and never observe
//! another task's uncommitted rows.

use std::collections::BTreeMap;
use std::path::Path;

use libsql::Builder;
use refgate_config::DatabasesConfig;
use refgate_core::Domain;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::DatabaseError;

/// Storage handle for a single domain.
pub struct DomainDb {
    domain: Domain,
    #[allow(dead_code)]
    db: libsql::Database,
    conn: Mutex<libsql::Connection>,
}

impl DomainDb {
    /// Open a local database for `domain` at `location` (a file path or
    /// `":memory:"`).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn open(domain: Domain, location: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(location).build().await?;
        let conn = db.connect()?;

        conn.execute("PRAGMA foreign_keys = ON", ()).await.map_err(|e| {
            DatabaseError::Query(format!("PRAGMA foreign_keys on {domain}: {e}"))
        })?;

        tracing::debug!(%domain, location, "opened domain database");
        Ok(Self {
            domain,
            db,
            conn: Mutex::new(conn),
        })
    }

    #[must_use]
    pub const fn domain(&self) -> Domain {
        self.domain
    }

    /// Exclusive access to the domain's connection.
    ///
    /// Hold the guard for the whole unit of work: a transaction from begin to
    /// commit, or a query until its rows are drained.
    pub async fn conn(&self) -> MutexGuard<'_, libsql::Connection> {
        self.conn.lock().await
    }
}

/// Fixed map from domain to its storage handle.
pub struct EngineRegistry {
    domains: BTreeMap<Domain, DomainDb>,
}

impl EngineRegistry {
    /// Open every domain listed in `config`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the data directory cannot be created or any
    /// domain fails to open.
    pub async fn open(config: &DatabasesConfig) -> Result<Self, DatabaseError> {
        if !config.in_memory {
            create_data_dir(&config.data_dir)?;
        }

        let mut domains = BTreeMap::new();
        for &domain in &config.domains {
            let db = DomainDb::open(domain, &config.location(domain)).await?;
            domains.insert(domain, db);
        }

        tracing::info!(domains = domains.len(), "engine registry ready");
        Ok(Self { domains })
    }

    /// In-memory databases for every domain.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if any domain fails to open.
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        Self::open(&DatabasesConfig::in_memory()).await
    }

    /// Look up the handle for `domain`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::UnknownDomain` if the domain was not opened.
    pub fn domain(&self, domain: Domain) -> Result<&DomainDb, DatabaseError> {
        self.domains
            .get(&domain)
            .ok_or(DatabaseError::UnknownDomain(domain))
    }

    #[must_use]
    pub fn contains(&self, domain: Domain) -> bool {
        self.domains.contains_key(&domain)
    }

    /// Enabled domains in declaration order.
    pub fn domains(&self) -> impl Iterator<Item = Domain> + '_ {
        self.domains.keys().copied()
    }
}

fn create_data_dir(dir: &Path) -> Result<(), DatabaseError> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}
