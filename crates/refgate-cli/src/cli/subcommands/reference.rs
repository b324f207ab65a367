use clap::Subcommand;
use refgate_core::Domain;

use super::parse_domain;

/// Reference checks against owning domains.
#[derive(Clone, Debug, Subcommand)]
pub enum RefCommands {
    /// Confirm a live record exists (exit code 3 when it does not).
    Check {
        #[arg(value_parser = parse_domain)]
        domain: Domain,
        id: i64,
    },
    /// Resolve several ids with one batched lookup.
    Resolve {
        #[arg(value_parser = parse_domain)]
        domain: Domain,
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },
}
