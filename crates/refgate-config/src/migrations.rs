//! Migration runner configuration.

use refgate_core::Domain;
use serde::{Deserialize, Serialize};

const fn default_status_domain() -> Domain {
    Domain::Settings
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MigrationsConfig {
    /// Domain whose database hosts the `migration_status` table.
    #[serde(default = "default_status_domain")]
    pub status_domain: Domain,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            status_domain: default_status_domain(),
        }
    }
}
