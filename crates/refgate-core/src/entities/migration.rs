use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::Domain;

/// Latest outcome of attempting one migration against one domain.
///
/// Unique per `(domain, migration_name)`. Written only by the migration
/// runner; rows are overwritten on re-run and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MigrationRecord {
    pub migration_name: String,
    pub domain: Domain,
    pub success: bool,
    pub executed_at: DateTime<Utc>,
    pub error_message: Option<String>,
}
