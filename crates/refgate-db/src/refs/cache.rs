//! TTL-bounded cache of master records keyed by `(domain, id)`.
//!
//! Misses are resolved with live queries against the owning domain. A batch
//! lookup issues at most one query covering every miss, which keeps pages of
//! entities that embed references from turning into N+1 query patterns.
//!
//! An entry older than the TTL is never served. Concurrent misses for the same
//! key may both query and both store; they store the same row, so the last
//! write is equivalent to the first.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use indexmap::IndexMap;
use refgate_config::CacheConfig;
use refgate_core::Domain;
use refgate_core::entities::MasterRecord;
use refgate_core::responses::CacheStats;
use tokio::time::Instant;

use crate::error::{DatabaseError, ReferenceError};
use crate::helpers::{placeholders, row_to_json_map};
use crate::registry::EngineRegistry;

/// Most ids one live query binds (SQLite's default variable limit).
pub const MAX_BATCH_IDS: usize = 32_766;

struct CacheEntry {
    record: MasterRecord,
    cached_at: Instant,
}

/// Shared, concurrently readable reference cache.
pub struct ReferenceCache {
    registry: Arc<EngineRegistry>,
    ttl: Duration,
    entries: DashMap<(Domain, i64), CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
    live_queries: AtomicU64,
}

impl ReferenceCache {
    #[must_use]
    pub fn new(registry: Arc<EngineRegistry>, ttl: Duration) -> Self {
        Self {
            registry,
            ttl,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            live_queries: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn from_config(registry: Arc<EngineRegistry>, config: &CacheConfig) -> Self {
        Self::new(registry, config.ttl())
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve one id. A miss costs exactly one live query.
    ///
    /// # Errors
    ///
    /// `ReferenceError::NotFound` if the owning domain has no such record,
    /// `ReferenceError::Unresolvable` if the live query fails.
    pub async fn get(&self, domain: Domain, id: i64) -> Result<MasterRecord, ReferenceError> {
        if let Some(record) = self.lookup(domain, id) {
            tracing::debug!(%domain, id, "cache hit");
            return Ok(record);
        }
        tracing::debug!(%domain, id, "cache miss");
        self.fetch_live(domain, &[id])
            .await?
            .into_iter()
            .next()
            .map(|record| {
                self.store(domain, record.clone());
                record
            })
            .ok_or(ReferenceError::NotFound { domain, id })
    }

    /// Resolve many ids with at most one live query.
    ///
    /// The result follows the caller's order (first occurrence wins for
    /// duplicates). Ids with no record in the owning domain are left out.
    /// At most [`MAX_BATCH_IDS`] distinct ids may miss the cache; larger
    /// batches are rejected before any query runs.
    ///
    /// # Errors
    ///
    /// `ReferenceError::BatchTooLarge` if too many ids miss the cache,
    /// `ReferenceError::Unresolvable` if the live query fails.
    pub async fn get_batch(
        &self,
        domain: Domain,
        ids: &[i64],
    ) -> Result<IndexMap<i64, MasterRecord>, ReferenceError> {
        let mut found: IndexMap<i64, Option<MasterRecord>> = IndexMap::with_capacity(ids.len());
        let mut missing = Vec::new();
        for &id in ids {
            if found.contains_key(&id) {
                continue;
            }
            let cached = self.lookup(domain, id);
            if cached.is_none() {
                missing.push(id);
            }
            found.insert(id, cached);
        }

        if !missing.is_empty() {
            for record in self.fetch_live(domain, &missing).await? {
                self.store(domain, record.clone());
                if let Some(slot) = found.get_mut(&record.id) {
                    *slot = Some(record);
                }
            }
        }

        tracing::debug!(
            %domain,
            requested = ids.len(),
            missed = missing.len(),
            "batch resolved"
        );
        Ok(found
            .into_iter()
            .filter_map(|(id, record)| record.map(|r| (id, r)))
            .collect())
    }

    /// Drop one cached record. Owning domains call this after mutating it.
    pub fn invalidate(&self, domain: Domain, id: i64) {
        self.entries.remove(&(domain, id));
    }

    /// Drop every cached record of `domain`.
    pub fn invalidate_all(&self, domain: Domain) {
        self.entries.retain(|(d, _), _| *d != domain);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            live_queries: self.live_queries.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    /// Fresh cached record, evicting it if expired.
    fn lookup(&self, domain: Domain, id: i64) -> Option<MasterRecord> {
        let key = (domain, id);
        if let Some(entry) = self.entries.get(&key)
            && entry.cached_at.elapsed() < self.ttl
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.record.clone());
        }
        self.entries
            .remove_if(&key, |_, entry| entry.cached_at.elapsed() >= self.ttl);
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub(crate) fn store(&self, domain: Domain, record: MasterRecord) {
        self.entries.insert(
            (domain, record.id),
            CacheEntry {
                record,
                cached_at: Instant::now(),
            },
        );
    }

    /// One `SELECT … WHERE id IN (…)` against the owning domain.
    ///
    /// Bypasses the cache entirely; callers decide what to store.
    pub(crate) async fn fetch_live(
        &self,
        domain: Domain,
        ids: &[i64],
    ) -> Result<Vec<MasterRecord>, ReferenceError> {
        let unique: Vec<i64> = {
            let mut seen = HashSet::with_capacity(ids.len());
            ids.iter().copied().filter(|id| seen.insert(*id)).collect()
        };
        if unique.is_empty() {
            return Ok(Vec::new());
        }
        if unique.len() > MAX_BATCH_IDS {
            return Err(ReferenceError::BatchTooLarge {
                domain,
                requested: unique.len(),
                limit: MAX_BATCH_IDS,
            });
        }

        self.live_queries.fetch_add(1, Ordering::Relaxed);
        let source = domain.master_source();
        let sql = format!(
            "SELECT * FROM {} WHERE {} IN ({})",
            source.table,
            source.id_column,
            placeholders(unique.len())
        );

        let fetch = async {
            let db = self.registry.domain(domain)?;
            let conn = db.conn().await;
            let mut rows = conn
                .query(&sql, libsql::params_from_iter(unique.iter().copied()))
                .await?;
            let mut records = Vec::with_capacity(unique.len());
            while let Some(row) = rows.next().await? {
                let fields = row_to_json_map(&row)?;
                let id = fields
                    .get(source.id_column)
                    .and_then(serde_json::Value::as_i64)
                    .ok_or_else(|| {
                        DatabaseError::Query(format!(
                            "{}.{} is not an integer",
                            source.table, source.id_column
                        ))
                    })?;
                records.push(MasterRecord { id, fields });
            }
            Ok::<_, DatabaseError>(records)
        };

        fetch.await.map_err(|source| {
            tracing::warn!(%domain, error = %source, "live reference query failed");
            ReferenceError::Unresolvable { domain, source }
        })
    }
}
