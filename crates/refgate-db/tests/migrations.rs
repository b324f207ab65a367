//! Migration engine integration tests.
//!
//! - Idempotence: second run executes nothing and still records success
//! - Failure isolation: a broken unit never stops its neighbours
//! - Status store: one record per unit, fatal when unwritable
//! - Probe fallback when the schema exists but no status was recorded

use std::sync::Arc;

use pretty_assertions::assert_eq;

use refgate_core::Domain;
use refgate_core::responses::MigrationOutcome;
use refgate_db::error::MigrationError;
use refgate_db::migrations::{MigrationRunner, MigrationUnit, Probe, StatusStore};
use refgate_db::registry::EngineRegistry;

async fn registry() -> Arc<EngineRegistry> {
    Arc::new(EngineRegistry::in_memory().await.unwrap())
}

async fn runner(registry: &Arc<EngineRegistry>) -> MigrationRunner {
    let status = StatusStore::open(Arc::clone(registry), Domain::Settings)
        .await
        .unwrap();
    MigrationRunner::new(Arc::clone(registry), status)
}

fn materials_table() -> MigrationUnit {
    MigrationUnit::create_table(
        "create_materials",
        Domain::Materials,
        "materials",
        "CREATE TABLE materials (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
    )
}

fn unit_id_column() -> MigrationUnit {
    MigrationUnit::add_column(
        "add_materials_unit_id",
        Domain::Materials,
        "materials",
        "unit_id",
        "INTEGER",
    )
}

async fn columns(registry: &EngineRegistry, domain: Domain, table: &str) -> Vec<String> {
    let mut rows = registry
        .domain(domain)
        .unwrap()
        .conn()
        .await
        .query("SELECT name FROM pragma_table_info(?1)", [table])
        .await
        .unwrap();
    let mut names = Vec::new();
    while let Some(row) = rows.next().await.unwrap() {
        names.push(row.get::<String>(0).unwrap());
    }
    names
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn nullable_column_applies_once() {
    let registry = registry().await;
    let mut runner = runner(&registry).await;
    runner
        .register_all([materials_table(), unit_id_column()])
        .unwrap();

    let first = runner.run_all().await.unwrap();
    assert_eq!(first.failed, 0);
    assert_eq!(first.details[1].outcome, MigrationOutcome::Applied);
    assert_eq!(first.details[1].statements_executed, 1);
    assert!(
        columns(&registry, Domain::Materials, "materials")
            .await
            .contains(&"unit_id".to_string())
    );

    let second = runner.run_all().await.unwrap();
    assert_eq!(second.successful, 2);
    assert_eq!(second.statements_executed(), 0);
    assert!(
        second
            .details
            .iter()
            .all(|d| d.outcome == MigrationOutcome::AlreadyApplied)
    );

    let record = runner
        .get_record(Domain::Materials, "add_materials_unit_id")
        .await
        .unwrap()
        .unwrap();
    assert!(record.success);
    assert!(record.error_message.is_none());
}

#[tokio::test]
async fn probe_skips_schema_that_already_exists() {
    let registry = registry().await;
    registry
        .domain(Domain::Materials)
        .unwrap()
        .conn()
        .await
        .execute(
            "CREATE TABLE materials (id INTEGER PRIMARY KEY, name TEXT NOT NULL, unit_id INTEGER)",
            (),
        )
        .await
        .unwrap();

    let mut runner = runner(&registry).await;
    runner
        .register_all([materials_table(), unit_id_column()])
        .unwrap();

    let report = runner.run_all().await.unwrap();
    assert_eq!(report.failed, 0);
    assert_eq!(report.statements_executed(), 0);
    assert!(
        report
            .details
            .iter()
            .all(|d| d.outcome == MigrationOutcome::AlreadyApplied && d.success)
    );
    assert_eq!(runner.get_status().await.unwrap().len(), 2);
}

#[tokio::test]
async fn status_survives_reopen_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = refgate_config::DatabasesConfig {
        domains: vec![Domain::Settings, Domain::Materials],
        ..refgate_config::DatabasesConfig::at(dir.path())
    };

    {
        let registry = Arc::new(EngineRegistry::open(&config).await.unwrap());
        let mut runner = runner(&registry).await;
        runner.register(materials_table()).unwrap();
        let report = runner.run_all().await.unwrap();
        assert_eq!(report.details[0].outcome, MigrationOutcome::Applied);
    }

    let registry = Arc::new(EngineRegistry::open(&config).await.unwrap());
    let mut runner = runner(&registry).await;
    runner.register(materials_table()).unwrap();
    let report = runner.run_all().await.unwrap();
    assert_eq!(report.details[0].outcome, MigrationOutcome::AlreadyApplied);
    assert_eq!(report.statements_executed(), 0);
}

// ---------------------------------------------------------------------------
// Failure isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_statement_does_not_stop_the_batch() {
    let registry = registry().await;
    let mut runner = runner(&registry).await;
    runner
        .register_all([
            materials_table(),
            MigrationUnit::new("broken", Domain::Materials).statement("CREAT TABLE nope (id)"),
            unit_id_column(),
            MigrationUnit::create_table(
                "create_units",
                Domain::Units,
                "units",
                "CREATE TABLE units (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
            ),
        ])
        .unwrap();

    let report = runner.run_all().await.unwrap();
    assert_eq!(report.total_migrations, 4);
    assert_eq!(report.successful, 3);
    assert_eq!(report.failed, 1);

    let broken = &report.details[1];
    assert_eq!(broken.migration_name, "broken");
    assert!(!broken.success);
    assert_eq!(broken.outcome, MigrationOutcome::Failed);
    assert!(broken.error_message.as_deref().unwrap().contains("CREAT TABLE"));
    assert_eq!(report.details[2].outcome, MigrationOutcome::Applied);

    let record = runner
        .get_record(Domain::Materials, "broken")
        .await
        .unwrap()
        .unwrap();
    assert!(!record.success);
    assert!(record.error_message.is_some());
}

#[tokio::test]
async fn failed_statement_rolls_back_its_unit() {
    let registry = registry().await;
    let mut runner = runner(&registry).await;
    runner
        .register(
            MigrationUnit::new("half_done", Domain::Units)
                .probe(Probe::table("half"))
                .statement("CREATE TABLE half (id INTEGER PRIMARY KEY)")
                .statement("INSERT INTO missing_table VALUES (1)"),
        )
        .unwrap();

    let report = runner.run_all().await.unwrap();
    assert_eq!(report.failed, 1);
    assert!(
        columns(&registry, Domain::Units, "half").await.is_empty(),
        "partial DDL must be rolled back"
    );
}

#[tokio::test]
async fn failed_units_are_retried() {
    let registry = registry().await;
    let mut runner = runner(&registry).await;
    runner
        .register(MigrationUnit::new("broken", Domain::Units).statement("NOT SQL"))
        .unwrap();

    runner.run_all().await.unwrap();
    let second = runner.run_all().await.unwrap();
    assert_eq!(second.details[0].outcome, MigrationOutcome::Failed);
}

#[tokio::test]
async fn failing_probe_is_recorded_not_raised() {
    let registry = registry().await;
    let mut runner = runner(&registry).await;
    runner
        .register(
            MigrationUnit::new("seed_units", Domain::Units)
                .probe(Probe::row("SELECT 1 FROM no_such_table"))
                .statement("CREATE TABLE units (id INTEGER PRIMARY KEY)"),
        )
        .unwrap();

    let report = runner.run_all().await.unwrap();
    assert_eq!(report.failed, 1);
    assert!(
        report.details[0]
            .error_message
            .as_deref()
            .unwrap()
            .contains("Schema probe")
    );
}

// ---------------------------------------------------------------------------
// Status store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_has_one_record_per_unit_regardless_of_failures() {
    let registry = registry().await;
    let mut runner = runner(&registry).await;
    runner
        .register_all([
            materials_table(),
            MigrationUnit::new("broken_a", Domain::Materials).statement("garbage"),
            MigrationUnit::new("broken_b", Domain::Samples).statement("more garbage"),
            unit_id_column(),
        ])
        .unwrap();

    let report = runner.run_all().await.unwrap();
    assert_eq!(report.details.len(), runner.units().len());

    let status = runner.get_status().await.unwrap();
    assert_eq!(status.len(), runner.units().len());
    let keys: Vec<_> = status
        .iter()
        .map(|r| (r.domain, r.migration_name.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (Domain::Materials, "add_materials_unit_id"),
            (Domain::Materials, "broken_a"),
            (Domain::Materials, "create_materials"),
            (Domain::Samples, "broken_b"),
        ]
    );
}

#[tokio::test]
async fn unwritable_status_store_is_fatal() {
    let registry = registry().await;
    let mut runner = runner(&registry).await;
    runner.register(materials_table()).unwrap();

    registry
        .domain(Domain::Settings)
        .unwrap()
        .conn()
        .await
        .execute("DROP TABLE migration_status", ())
        .await
        .unwrap();

    let result = runner.run_all().await;
    assert!(matches!(result, Err(MigrationError::StatusStore { .. })));
}

#[tokio::test]
async fn run_domain_only_touches_that_domain() {
    let registry = registry().await;
    let mut runner = runner(&registry).await;
    runner
        .register_all([
            materials_table(),
            MigrationUnit::create_table(
                "create_units",
                Domain::Units,
                "units",
                "CREATE TABLE units (id INTEGER PRIMARY KEY)",
            ),
        ])
        .unwrap();

    let report = runner.run_domain(Domain::Units).await.unwrap();
    assert_eq!(report.total_migrations, 1);
    assert_eq!(report.details[0].domain, Domain::Units);
    assert!(columns(&registry, Domain::Materials, "materials").await.is_empty());
    assert!(
        runner
            .get_record(Domain::Materials, "create_materials")
            .await
            .unwrap()
            .is_none()
    );
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn registration_rejects_bad_units() {
    let registry = registry().await;
    let mut runner = runner(&registry).await;
    runner.register(materials_table()).unwrap();

    for unit in [
        materials_table(),
        MigrationUnit::new("", Domain::Units).statement("SELECT 1"),
        MigrationUnit::new("empty", Domain::Units),
    ] {
        assert!(matches!(
            runner.register(unit),
            Err(MigrationError::InvalidUnit { .. })
        ));
    }
    assert_eq!(runner.units().len(), 1);
}
