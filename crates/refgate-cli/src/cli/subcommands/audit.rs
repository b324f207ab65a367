use clap::Subcommand;
use refgate_core::Domain;

use super::parse_domain;

/// Reference audit trail queries.
#[derive(Clone, Debug, Subcommand)]
pub enum AuditCommands {
    /// Full change history of one record, oldest first.
    History {
        /// Domain owning the record.
        #[arg(long, value_parser = parse_domain)]
        domain: Domain,
        /// Table of the record.
        #[arg(long)]
        table: String,
        /// Record id.
        #[arg(long)]
        record: i64,
    },
    /// Latest changes in a domain, newest first.
    Recent {
        #[arg(long, value_parser = parse_domain)]
        domain: Domain,
        /// Max rows (defaults to `general.default_limit`).
        #[arg(short, long)]
        limit: Option<u32>,
    },
}
