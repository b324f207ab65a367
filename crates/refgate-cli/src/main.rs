use anyhow::Context;
use clap::Parser;
use refgate_db::error::ReferenceError;

mod bootstrap;
mod cli;
mod commands;
mod context;
mod output;

/// Exit status for a reference that does not exist in its owning domain.
const EXIT_REFERENCE_NOT_FOUND: i32 = 3;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("refgate error: {error:#}");
        std::process::exit(exit_code(&error));
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();

    if let cli::Commands::Schema(args) = &cli.command {
        return commands::schema::handle(args, &flags);
    }

    let config = bootstrap::load_config(&flags)?;
    let ctx = context::AppContext::init(config)
        .await
        .context("failed to open domain databases")?;

    commands::dispatch::dispatch(cli.command, &ctx, &flags).await
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("REFGATE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

/// A rejected reference is distinguishable from a generic fault.
fn exit_code(error: &anyhow::Error) -> i32 {
    let not_found = error.chain().any(|cause| {
        cause
            .downcast_ref::<ReferenceError>()
            .is_some_and(ReferenceError::is_not_found)
    });
    if not_found { EXIT_REFERENCE_NOT_FOUND } else { 1 }
}

#[cfg(test)]
mod tests {
    use refgate_core::Domain;

    use super::*;

    #[test]
    fn missing_reference_exits_with_dedicated_code() {
        let error = anyhow::Error::new(ReferenceError::NotFound {
            domain: Domain::Units,
            id: 99_999,
        })
        .context("ref check failed");
        assert_eq!(exit_code(&error), EXIT_REFERENCE_NOT_FOUND);
    }

    #[test]
    fn other_failures_exit_with_one() {
        let error = anyhow::anyhow!("disk on fire");
        assert_eq!(exit_code(&error), 1);
    }
}
