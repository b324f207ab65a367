use crate::cli::GlobalFlags;
use crate::cli::subcommands::MigrateCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `refgate migrate`.
pub async fn handle(
    action: &MigrateCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let runner = ctx.layer.runner();
    match action {
        MigrateCommands::Status => output(&runner.get_status().await?, flags.format),
        MigrateCommands::Run { domain } => {
            let report = match domain {
                Some(domain) => runner.run_domain(*domain).await?,
                None => runner.run_all().await?,
            };
            if report.failed > 0 {
                tracing::warn!(
                    failed = report.failed,
                    total = report.total_migrations,
                    "some migrations failed; see details"
                );
            }
            output(&report, flags.format)
        }
    }
}
