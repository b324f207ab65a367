//! Admin response types returned as JSON by `refgate migrate` commands.
//!
//! These define the boundary contract consumed by any external admin layer:
//! `migrate status` emits `Vec<MigrationRecord>`, `migrate run` emits
//! [`RunReport`]. The `ref` commands emit [`ReferenceCheck`] and
//! [`ResolveResponse`].

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::Domain;
use crate::entities::MasterRecord;

/// What happened to one migration unit during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// Statements ran and committed.
    Applied,
    /// Status store or schema probe showed the change is already present.
    AlreadyApplied,
    /// Probe or apply failed; the transaction was rolled back.
    Failed,
}

impl MigrationOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::AlreadyApplied => "already_applied",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

impl fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-migration line of a [`RunReport`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MigrationDetail {
    pub migration_name: String,
    pub domain: Domain,
    pub success: bool,
    pub outcome: MigrationOutcome,
    pub statements_executed: u32,
    pub executed_at: DateTime<Utc>,
    pub error_message: Option<String>,
}

/// Response from `refgate migrate run`.
///
/// `details` always has one entry per registered migration, in registration
/// order, regardless of how many failed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RunReport {
    pub total_migrations: usize,
    pub successful: usize,
    pub failed: usize,
    pub details: Vec<MigrationDetail>,
}

impl RunReport {
    #[must_use]
    pub fn from_details(details: Vec<MigrationDetail>) -> Self {
        let successful = details.iter().filter(|d| d.success).count();
        Self {
            total_migrations: details.len(),
            successful,
            failed: details.len() - successful,
            details,
        }
    }

    /// Total mutating statements issued across the run.
    #[must_use]
    pub fn statements_executed(&self) -> u32 {
        self.details.iter().map(|d| d.statements_executed).sum()
    }
}

/// Counters exposed by the reference cache.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub live_queries: u64,
    pub entries: usize,
}

/// Response from `refgate ref check` when the record exists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReferenceCheck {
    pub domain: Domain,
    pub id: i64,
    pub exists: bool,
}

/// Response from `refgate ref resolve`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ResolveResponse {
    pub domain: Domain,
    /// Resolved records in request order.
    pub resolved: Vec<MasterRecord>,
    /// Requested ids with no record in the owning domain.
    pub missing: Vec<i64>,
    pub cache: CacheStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn detail(name: &str, outcome: MigrationOutcome) -> MigrationDetail {
        MigrationDetail {
            migration_name: name.to_string(),
            domain: Domain::Units,
            success: outcome.is_success(),
            outcome,
            statements_executed: u32::from(outcome == MigrationOutcome::Applied),
            executed_at: Utc::now(),
            error_message: (outcome == MigrationOutcome::Failed).then(|| "boom".to_string()),
        }
    }

    #[test]
    fn report_counts_successes_and_failures() {
        let report = RunReport::from_details(vec![
            detail("a", MigrationOutcome::Applied),
            detail("b", MigrationOutcome::Failed),
            detail("c", MigrationOutcome::AlreadyApplied),
        ]);
        assert_eq!(report.total_migrations, 3);
        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.statements_executed(), 1);
    }

    #[test]
    fn outcome_serializes_snake_case() {
        let json = serde_json::to_string(&MigrationOutcome::AlreadyApplied).unwrap();
        assert_eq!(json, "\"already_applied\"");
    }
}
