use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuditCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `refgate audit`.
pub async fn handle(
    action: &AuditCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let audit = ctx.layer.audit();
    let records = match action {
        AuditCommands::History {
            domain,
            table,
            record,
        } => audit.history(*domain, table, *record).await?,
        AuditCommands::Recent { domain, limit } => {
            let limit = limit.unwrap_or(ctx.config.general.default_limit);
            audit.recent(*domain, limit).await?
        }
    };
    output(&records, flags.format)
}
