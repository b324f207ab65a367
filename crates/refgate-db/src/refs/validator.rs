//! Write-boundary existence checks for cross-domain references.
//!
//! Validation always asks the owning domain; a cached entry never counts as
//! proof of existence. What remains is the window between a successful
//! validation and the caller's commit, during which the owning domain may
//! delete the record. That window is accepted and kept short by validating
//! immediately before the write; the audit trail makes any resulting drift
//! detectable afterwards.

use std::sync::Arc;

use refgate_core::{Domain, Reference};

use crate::error::ReferenceError;
use crate::refs::cache::ReferenceCache;

#[derive(Clone)]
pub struct ReferenceValidator {
    cache: Arc<ReferenceCache>,
}

impl ReferenceValidator {
    #[must_use]
    pub const fn new(cache: Arc<ReferenceCache>) -> Self {
        Self { cache }
    }

    #[must_use]
    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    /// Confirm a live record exists for `id` in `domain`.
    ///
    /// Refreshes the cache on success and evicts the key when the record is
    /// gone.
    ///
    /// # Errors
    ///
    /// `ReferenceError::NotFound` when no live record exists,
    /// `ReferenceError::Unresolvable` when the owning domain cannot be queried.
    pub async fn validate(&self, domain: Domain, id: i64) -> Result<(), ReferenceError> {
        match self.cache.fetch_live(domain, &[id]).await?.into_iter().next() {
            Some(record) => {
                self.cache.store(domain, record);
                Ok(())
            }
            None => {
                self.cache.invalidate(domain, id);
                tracing::debug!(%domain, id, "reference rejected");
                Err(ReferenceError::NotFound { domain, id })
            }
        }
    }

    /// # Errors
    ///
    /// See [`Self::validate`].
    pub async fn validate_reference(&self, reference: &Reference) -> Result<(), ReferenceError> {
        self.validate(reference.domain, reference.id).await
    }

    /// A `None` reference (nullable column left empty) is always valid.
    ///
    /// # Errors
    ///
    /// See [`Self::validate`].
    pub async fn validate_optional(
        &self,
        reference: Option<&Reference>,
    ) -> Result<(), ReferenceError> {
        match reference {
            Some(reference) => self.validate_reference(reference).await,
            None => Ok(()),
        }
    }

    /// Validate a set of ids with one live query.
    ///
    /// # Errors
    ///
    /// `ReferenceError::NotFound` naming the first id (in caller order) with
    /// no live record, `ReferenceError::BatchTooLarge` past
    /// [`MAX_BATCH_IDS`](crate::refs::cache::MAX_BATCH_IDS) distinct ids.
    pub async fn validate_all(&self, domain: Domain, ids: &[i64]) -> Result<(), ReferenceError> {
        let records = self.cache.fetch_live(domain, ids).await?;
        let mut missing = None;
        for &id in ids {
            if missing.is_none() && !records.iter().any(|r| r.id == id) {
                missing = Some(id);
            }
        }
        for record in records {
            self.cache.store(domain, record);
        }
        match missing {
            Some(id) => {
                self.cache.invalidate(domain, id);
                Err(ReferenceError::NotFound { domain, id })
            }
            None => Ok(()),
        }
    }
}
