use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Migrate { action } => commands::migrate::handle(&action, ctx, flags).await,
        Commands::Ref { action } => commands::reference::handle(&action, ctx, flags).await,
        Commands::Audit { action } => commands::audit::handle(&action, ctx, flags).await,
        Commands::Schema(args) => commands::schema::handle(&args, flags),
    }
}
