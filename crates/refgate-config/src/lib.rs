//! # refgate-config
//!
//! Layered configuration loading for refgate using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`REFGATE_*` prefix, `__` as separator)
//! 2. Project-level `.refgate/config.toml`
//! 3. User-level `~/.config/refgate/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `REFGATE_CACHE__TTL_SECS` -> `cache.ttl_secs`,
//! `REFGATE_MIGRATIONS__STATUS_DOMAIN` -> `migrations.status_domain`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use refgate_config::RefgateConfig;
//!
//! let config = RefgateConfig::load_with_dotenv().expect("config");
//! println!("cache ttl: {:?}", config.cache.ttl());
//! ```

mod cache;
mod databases;
mod error;
mod general;
mod migrations;

pub use cache::CacheConfig;
pub use databases::DatabasesConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use migrations::MigrationsConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RefgateConfig {
    #[serde(default)]
    pub databases: DatabasesConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub migrations: MigrationsConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl RefgateConfig {
    /// Load configuration from all sources relative to the current directory.
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or the result is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration with `project_dir/.refgate/config.toml` as the
    /// project layer.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or the result is invalid.
    pub fn load_from(project_dir: &Path) -> Result<Self, ConfigError> {
        let config: Self = Self::figment_for(project_dir).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or the result is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain rooted at the current directory.
    pub fn figment() -> Figment {
        Self::figment_for(Path::new("."))
    }

    /// Build the figment provider chain with a specific project directory.
    ///
    /// Public so tests can inspect the figment or add providers on top.
    pub fn figment_for(project_dir: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = project_dir.join(".refgate").join("config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("REFGATE_").split("__"))
    }

    /// Cross-section checks that figment cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.databases.validate()?;
        if !self
            .databases
            .domains
            .contains(&self.migrations.status_domain)
        {
            return Err(ConfigError::InvalidValue {
                field: "migrations.status_domain".into(),
                reason: format!(
                    "domain '{}' is not enabled in databases.domains",
                    self.migrations.status_domain
                ),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("refgate").join("config.toml"))
    }
}
