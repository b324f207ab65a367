//! Entity structs persisted by the consistency layer.
//!
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` so the
//! admin surface can emit them as JSON and publish their schema.

mod audit;
mod master;
mod migration;

pub use audit::{AuditRecord, NewAuditRecord};
pub use master::MasterRecord;
pub use migration::MigrationRecord;
