use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `refgate` binary.
#[derive(Debug, Parser)]
#[command(
    name = "refgate",
    version,
    about = "refgate - cross-database migrations, reference checks, and audit history"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory containing `.refgate/config.toml` (defaults to the current directory)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            config_dir: self.config_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use refgate_core::Domain;

    use super::subcommands::{AuditCommands, MigrateCommands, RefCommands};
    use super::{Cli, Commands, OutputFormat};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from(["refgate", "--format", "raw", "--verbose", "migrate", "status"])
            .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Migrate {
                action: MigrateCommands::Status
            }
        ));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["refgate", "migrate", "run", "--quiet", "--domain", "units"])
            .expect("cli should parse");

        assert!(cli.quiet);
        assert!(matches!(
            cli.command,
            Commands::Migrate {
                action: MigrateCommands::Run {
                    domain: Some(Domain::Units)
                }
            }
        ));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["refgate", "--format", "xml", "migrate", "status"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn unknown_domain_is_rejected() {
        let parsed = Cli::try_parse_from(["refgate", "ref", "check", "warehouses", "1"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn ref_resolve_takes_many_ids() {
        let cli = Cli::try_parse_from(["refgate", "ref", "resolve", "units", "3", "1", "3"])
            .expect("cli should parse");
        let Commands::Ref {
            action: RefCommands::Resolve { domain, ids },
        } = cli.command
        else {
            panic!("expected ref resolve");
        };
        assert_eq!(domain, Domain::Units);
        assert_eq!(ids, vec![3, 1, 3]);
    }

    #[test]
    fn audit_history_requires_table_and_record() {
        let cli = Cli::try_parse_from([
            "refgate",
            "audit",
            "history",
            "--domain",
            "materials",
            "--table",
            "materials",
            "--record",
            "7",
        ])
        .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Audit {
                action: AuditCommands::History { record: 7, .. }
            }
        ));

        let missing = Cli::try_parse_from(["refgate", "audit", "history", "--domain", "materials"]);
        assert!(missing.is_err());
    }

    #[test]
    fn config_dir_is_global() {
        let cli = Cli::try_parse_from(["refgate", "migrate", "status", "--config-dir", "/tmp/demo"])
            .expect("cli should parse");
        assert_eq!(
            cli.global_flags().config_dir.as_deref(),
            Some(std::path::Path::new("/tmp/demo"))
        );
    }
}
