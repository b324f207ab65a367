//! Declarative migration units.
//!
//! A unit names its target domain, a precondition probe, and the statements
//! that produce the change. The runner, not the unit author, decides whether
//! to apply: the probe is consulted first and the statements only run when it
//! reports the change as missing.

use std::fmt;

use refgate_core::Domain;

use crate::error::DatabaseError;

/// Introspection check answering "is this change already present?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    TableExists { table: String },
    ColumnExists { table: String, column: String },
    IndexExists { index: String },
    /// Custom query; any returned row means the change is present.
    RowExists { sql: String },
    /// Never present. Statements must be safe to repeat.
    Always,
}

impl Probe {
    #[must_use]
    pub fn table(table: &str) -> Self {
        Self::TableExists {
            table: table.to_string(),
        }
    }

    #[must_use]
    pub fn column(table: &str, column: &str) -> Self {
        Self::ColumnExists {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    #[must_use]
    pub fn index(index: &str) -> Self {
        Self::IndexExists {
            index: index.to_string(),
        }
    }

    #[must_use]
    pub fn row(sql: &str) -> Self {
        Self::RowExists {
            sql: sql.to_string(),
        }
    }

    /// Run the probe on `conn`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the introspection query fails.
    pub async fn is_applied(&self, conn: &libsql::Connection) -> Result<bool, DatabaseError> {
        let mut rows = match self {
            Self::TableExists { table } => {
                conn.query(
                    "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table.as_str()],
                )
                .await?
            }
            Self::ColumnExists { table, column } => {
                conn.query(
                    "SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2",
                    [table.as_str(), column.as_str()],
                )
                .await?
            }
            Self::IndexExists { index } => {
                conn.query(
                    "SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1",
                    [index.as_str()],
                )
                .await?
            }
            Self::RowExists { sql } => conn.query(sql, ()).await?,
            Self::Always => return Ok(false),
        };
        Ok(rows.next().await?.is_some())
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableExists { table } => write!(f, "table {table}"),
            Self::ColumnExists { table, column } => write!(f, "column {table}.{column}"),
            Self::IndexExists { index } => write!(f, "index {index}"),
            Self::RowExists { .. } => f.write_str("custom probe row"),
            Self::Always => f.write_str("unconditional"),
        }
    }
}

/// One registered schema or data change against one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    pub name: String,
    pub domain: Domain,
    pub probe: Probe,
    pub statements: Vec<String>,
}

impl MigrationUnit {
    /// Start a unit with an unconditional probe and no statements.
    #[must_use]
    pub fn new(name: &str, domain: Domain) -> Self {
        Self {
            name: name.to_string(),
            domain,
            probe: Probe::Always,
            statements: Vec::new(),
        }
    }

    #[must_use]
    pub fn probe(mut self, probe: Probe) -> Self {
        self.probe = probe;
        self
    }

    #[must_use]
    pub fn statement(mut self, sql: &str) -> Self {
        self.statements.push(sql.to_string());
        self
    }

    /// `CREATE TABLE` guarded by a table probe.
    #[must_use]
    pub fn create_table(name: &str, domain: Domain, table: &str, ddl: &str) -> Self {
        Self::new(name, domain)
            .probe(Probe::table(table))
            .statement(ddl)
    }

    /// `ALTER TABLE … ADD COLUMN` guarded by a column probe.
    #[must_use]
    pub fn add_column(
        name: &str,
        domain: Domain,
        table: &str,
        column: &str,
        definition: &str,
    ) -> Self {
        Self::new(name, domain)
            .probe(Probe::column(table, column))
            .statement(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"))
    }

    /// `CREATE INDEX` guarded by an index probe.
    #[must_use]
    pub fn create_index(name: &str, domain: Domain, index: &str, table: &str, columns: &str) -> Self {
        Self::new(name, domain)
            .probe(Probe::index(index))
            .statement(&format!("CREATE INDEX {index} ON {table}({columns})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DomainDb;
    use pretty_assertions::assert_eq;

    async fn conn() -> DomainDb {
        let db = DomainDb::open(Domain::Materials, ":memory:").await.unwrap();
        db.conn()
            .await
            .execute(
                "CREATE TABLE materials (id INTEGER PRIMARY KEY, name TEXT)",
                (),
            )
            .await
            .unwrap();
        db.conn()
            .await
            .execute("CREATE INDEX idx_materials_name ON materials(name)", ())
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn table_probe() {
        let db = conn().await;
        assert!(Probe::table("materials").is_applied(&*db.conn().await).await.unwrap());
        assert!(!Probe::table("samples").is_applied(&*db.conn().await).await.unwrap());
    }

    #[tokio::test]
    async fn column_probe() {
        let db = conn().await;
        assert!(Probe::column("materials", "name").is_applied(&*db.conn().await).await.unwrap());
        assert!(!Probe::column("materials", "unit_id").is_applied(&*db.conn().await).await.unwrap());
        assert!(!Probe::column("missing", "name").is_applied(&*db.conn().await).await.unwrap());
    }

    #[tokio::test]
    async fn index_probe() {
        let db = conn().await;
        assert!(Probe::index("idx_materials_name").is_applied(&*db.conn().await).await.unwrap());
        assert!(!Probe::index("idx_nope").is_applied(&*db.conn().await).await.unwrap());
    }

    #[tokio::test]
    async fn row_probe_and_failure() {
        let db = conn().await;
        assert!(!Probe::row("SELECT 1 FROM materials").is_applied(&*db.conn().await).await.unwrap());
        assert!(Probe::row("SELECT * FROM no_such_table").is_applied(&*db.conn().await).await.is_err());
    }

    #[tokio::test]
    async fn always_is_never_applied() {
        let db = conn().await;
        assert!(!Probe::Always.is_applied(&*db.conn().await).await.unwrap());
    }

    #[test]
    fn add_column_builds_alter() {
        let unit = MigrationUnit::add_column(
            "add_materials_unit_id",
            Domain::Materials,
            "materials",
            "unit_id",
            "INTEGER",
        );
        assert_eq!(unit.probe, Probe::column("materials", "unit_id"));
        assert_eq!(
            unit.statements,
            vec!["ALTER TABLE materials ADD COLUMN unit_id INTEGER".to_string()]
        );
    }
}
