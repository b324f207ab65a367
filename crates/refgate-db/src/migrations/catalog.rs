//! Built-in migrations and tracked reference fields.
//!
//! Each domain gets its master table; domains that embed references into
//! another domain get the nullable reference column, an index on it, and a
//! `reference_audit` table. Registration order matters only within a domain.

use refgate_core::Domain;

use crate::audit;
use crate::migrations::unit::MigrationUnit;

/// A column holding a [`Reference`](refgate_core::Reference) into another
/// domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedField {
    pub owner: Domain,
    pub table: &'static str,
    pub field: &'static str,
    pub target: Domain,
}

/// Every cross-domain reference column the standard schema defines.
pub const TRACKED_FIELDS: &[TrackedField] = &[
    TrackedField {
        owner: Domain::Materials,
        table: "materials",
        field: "unit_id",
        target: Domain::Units,
    },
    TrackedField {
        owner: Domain::Samples,
        table: "samples",
        field: "material_id",
        target: Domain::Materials,
    },
    TrackedField {
        owner: Domain::Samples,
        table: "samples",
        field: "size_color_id",
        target: Domain::Sizecolor,
    },
    TrackedField {
        owner: Domain::Merchandiser,
        table: "merchandisers",
        field: "user_id",
        target: Domain::Users,
    },
];

/// Look up a tracked field declaration.
#[must_use]
pub fn tracked_field(owner: Domain, table: &str, field: &str) -> Option<&'static TrackedField> {
    TRACKED_FIELDS
        .iter()
        .find(|f| f.owner == owner && f.table == table && f.field == field)
}

fn master_tables() -> Vec<MigrationUnit> {
    vec![
        MigrationUnit::create_table(
            "create_users",
            Domain::Users,
            "users",
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                display_name TEXT,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        ),
        MigrationUnit::create_table(
            "create_settings",
            Domain::Settings,
            "settings",
            "CREATE TABLE settings (
                id INTEGER PRIMARY KEY,
                key TEXT NOT NULL UNIQUE,
                value TEXT
            )",
        ),
        MigrationUnit::create_table(
            "create_units",
            Domain::Units,
            "units",
            "CREATE TABLE units (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                symbol TEXT
            )",
        ),
        MigrationUnit::create_table(
            "create_size_colors",
            Domain::Sizecolor,
            "size_colors",
            "CREATE TABLE size_colors (
                id INTEGER PRIMARY KEY,
                size TEXT,
                color TEXT
            )",
        ),
        MigrationUnit::create_table(
            "create_materials",
            Domain::Materials,
            "materials",
            "CREATE TABLE materials (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                code TEXT
            )",
        ),
        MigrationUnit::create_table(
            "create_samples",
            Domain::Samples,
            "samples",
            "CREATE TABLE samples (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            )",
        ),
        MigrationUnit::create_table(
            "create_merchandisers",
            Domain::Merchandiser,
            "merchandisers",
            "CREATE TABLE merchandisers (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            )",
        ),
    ]
}

fn reference_columns() -> Vec<MigrationUnit> {
    let mut units = Vec::new();
    for field in TRACKED_FIELDS {
        units.push(MigrationUnit::add_column(
            &format!("add_{}_{}", field.table, field.field),
            field.owner,
            field.table,
            field.field,
            "INTEGER",
        ));
        let index = format!("idx_{}_{}", field.table, field.field);
        units.push(MigrationUnit::create_index(
            &format!("create_{index}"),
            field.owner,
            &index,
            field.table,
            field.field,
        ));
    }
    units
}

fn audit_tables() -> Vec<MigrationUnit> {
    let mut owners: Vec<Domain> = TRACKED_FIELDS.iter().map(|f| f.owner).collect();
    owners.sort_unstable();
    owners.dedup();
    owners.into_iter().flat_map(audit::migration_units).collect()
}

/// The standard schema in registration order.
#[must_use]
pub fn standard_units() -> Vec<MigrationUnit> {
    let mut units = master_tables();
    units.extend(reference_columns());
    units.extend(audit_tables());
    units
}

/// Standard units restricted to the domains in `enabled`.
#[must_use]
pub fn standard_units_for(enabled: &[Domain]) -> Vec<MigrationUnit> {
    standard_units()
        .into_iter()
        .filter(|u| enabled.contains(&u.domain))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn unit_names_are_unique_per_domain() {
        let units = standard_units();
        let keys: HashSet<_> = units.iter().map(|u| (u.domain, u.name.clone())).collect();
        assert_eq!(keys.len(), units.len());
    }

    #[test]
    fn every_tracked_field_gets_column_and_index() {
        let names: HashSet<_> = standard_units().into_iter().map(|u| u.name).collect();
        for field in TRACKED_FIELDS {
            assert!(names.contains(&format!("add_{}_{}", field.table, field.field)));
            assert!(names.contains(&format!("create_idx_{}_{}", field.table, field.field)));
        }
    }

    #[test]
    fn master_table_precedes_its_columns() {
        let units = standard_units();
        let pos = |name: &str| units.iter().position(|u| u.name == name).unwrap();
        assert!(pos("create_materials") < pos("add_materials_unit_id"));
        assert!(pos("create_samples") < pos("add_samples_material_id"));
    }

    #[test]
    fn tracked_targets_are_other_domains() {
        for field in TRACKED_FIELDS {
            assert_ne!(field.owner, field.target);
            assert_eq!(
                tracked_field(field.owner, field.table, field.field),
                Some(field)
            );
        }
        assert!(tracked_field(Domain::Materials, "materials", "name").is_none());
    }

    #[test]
    fn filtering_by_domain() {
        let units = standard_units_for(&[Domain::Units]);
        assert!(units.iter().all(|u| u.domain == Domain::Units));
        assert!(!units.is_empty());
    }
}
