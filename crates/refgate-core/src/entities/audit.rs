use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An immutable record of one change to a cross-domain reference field.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditRecord {
    pub id: String,
    pub table_name: String,
    pub record_id: i64,
    pub field_name: String,
    pub old_reference_id: Option<i64>,
    pub new_reference_id: Option<i64>,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    pub change_reason: Option<String>,
}

/// Input for appending an audit record. The logger assigns `id` and
/// `changed_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditRecord {
    pub table_name: String,
    pub record_id: i64,
    pub field_name: String,
    pub old_reference_id: Option<i64>,
    pub new_reference_id: Option<i64>,
    pub changed_by: String,
    pub change_reason: Option<String>,
}
