//! Idempotent schema migration engine.
//!
//! - [`unit`]: declarative `{name, domain, probe, statements}` units
//! - [`status`]: persisted latest outcome per `(domain, migration_name)`
//! - [`runner`]: ordered execution with per-unit failure isolation
//! - [`catalog`]: the standard schema and its tracked reference fields

pub mod catalog;
pub mod runner;
pub mod status;
pub mod unit;

pub use catalog::{TrackedField, standard_units};
pub use runner::MigrationRunner;
pub use status::StatusStore;
pub use unit::{MigrationUnit, Probe};
