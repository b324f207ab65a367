use clap::Subcommand;
use refgate_core::Domain;

use super::parse_domain;

/// Migration administration.
#[derive(Clone, Debug, Subcommand)]
pub enum MigrateCommands {
    /// List the recorded outcome of every migration.
    Status,
    /// Run registered migrations.
    Run {
        /// Only run migrations targeting this domain.
        #[arg(long, value_parser = parse_domain)]
        domain: Option<Domain>,
    },
}
