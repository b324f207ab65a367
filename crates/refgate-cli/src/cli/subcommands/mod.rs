mod audit;
mod migrate;
mod reference;

pub use audit::AuditCommands;
pub use migrate::MigrateCommands;
pub use reference::RefCommands;

use refgate_core::Domain;

/// clap value parser for [`Domain`] names.
pub(crate) fn parse_domain(value: &str) -> Result<Domain, String> {
    value.parse().map_err(|error| format!("{error}"))
}
