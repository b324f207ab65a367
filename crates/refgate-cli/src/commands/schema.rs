use schemars::schema_for;

use refgate_core::entities::{AuditRecord, MigrationRecord};
use refgate_core::responses::{ReferenceCheck, ResolveResponse, RunReport};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{SchemaArgs, SchemaType};
use crate::output::output;

/// Handle `refgate schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(&schema_of(args.type_name), flags.format)
}

fn schema_of(type_name: SchemaType) -> schemars::Schema {
    match type_name {
        // `migrate status` emits a list of records
        SchemaType::MigrationRecord => schema_for!(Vec<MigrationRecord>),
        SchemaType::RunReport => schema_for!(RunReport),
        SchemaType::AuditRecord => schema_for!(AuditRecord),
        SchemaType::ReferenceCheck => schema_for!(ReferenceCheck),
        SchemaType::ResolveResponse => schema_for!(ResolveResponse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(type_name: SchemaType) -> Vec<String> {
        let value = serde_json::to_value(schema_of(type_name)).unwrap();
        value["properties"]
            .as_object()
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn run_report_schema_lists_contract_fields() {
        let props = properties(SchemaType::RunReport);
        for field in ["total_migrations", "successful", "failed", "details"] {
            assert!(props.iter().any(|p| p == field), "missing {field}");
        }
    }

    #[test]
    fn audit_record_schema_has_reference_columns() {
        let props = properties(SchemaType::AuditRecord);
        for field in ["old_reference_id", "new_reference_id", "changed_by", "changed_at"] {
            assert!(props.iter().any(|p| p == field), "missing {field}");
        }
    }

    #[test]
    fn migration_record_schema_is_an_array() {
        let value = serde_json::to_value(schema_of(SchemaType::MigrationRecord)).unwrap();
        assert_eq!(value["type"], "array");
    }
}
