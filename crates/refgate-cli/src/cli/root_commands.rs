use clap::{Args, Subcommand, ValueEnum};

use crate::cli::subcommands::{AuditCommands, MigrateCommands, RefCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Schema migrations across domain databases.
    Migrate {
        #[command(subcommand)]
        action: MigrateCommands,
    },
    /// Cross-domain reference checks and resolution.
    Ref {
        #[command(subcommand)]
        action: RefCommands,
    },
    /// Reference change history.
    Audit {
        #[command(subcommand)]
        action: AuditCommands,
    },
    /// Print the JSON Schema of an output type.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Output type to describe.
    #[arg(value_enum)]
    pub type_name: SchemaType,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SchemaType {
    MigrationRecord,
    RunReport,
    AuditRecord,
    ReferenceCheck,
    ResolveResponse,
}
