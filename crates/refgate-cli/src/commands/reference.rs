use std::collections::HashSet;

use refgate_core::responses::{ReferenceCheck, ResolveResponse};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::RefCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `refgate ref`.
pub async fn handle(action: &RefCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        RefCommands::Check { domain, id } => {
            ctx.layer.validator().validate(*domain, *id).await?;
            output(
                &ReferenceCheck {
                    domain: *domain,
                    id: *id,
                    exists: true,
                },
                flags.format,
            )
        }
        RefCommands::Resolve { domain, ids } => {
            let cache = ctx.layer.cache();
            let resolved = cache.get_batch(*domain, ids).await?;
            let mut seen = HashSet::new();
            let missing: Vec<i64> = ids
                .iter()
                .copied()
                .filter(|id| !resolved.contains_key(id) && seen.insert(*id))
                .collect();
            output(
                &ResolveResponse {
                    domain: *domain,
                    resolved: resolved.into_values().collect(),
                    missing,
                    cache: cache.stats(),
                },
                flags.format,
            )
        }
    }
}
