//! Per-domain database locations.

use std::path::{Path, PathBuf};

use refgate_core::Domain;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_data_dir() -> PathBuf {
    PathBuf::from(".refgate/data")
}

fn default_domains() -> Vec<Domain> {
    Domain::ALL.to_vec()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabasesConfig {
    /// Directory holding one `<domain>.db` file per domain.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Open every domain as `:memory:` (tests and dry runs).
    #[serde(default)]
    pub in_memory: bool,

    /// Domains to open. Defaults to all of them.
    #[serde(default = "default_domains")]
    pub domains: Vec<Domain>,
}

impl Default for DatabasesConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            in_memory: false,
            domains: default_domains(),
        }
    }
}

impl DatabasesConfig {
    /// In-memory databases for every domain.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            ..Self::default()
        }
    }

    /// File databases for every domain under `dir`.
    #[must_use]
    pub fn at(dir: &Path) -> Self {
        Self {
            data_dir: dir.to_path_buf(),
            ..Self::default()
        }
    }

    /// Location string handed to the database builder for `domain`.
    #[must_use]
    pub fn location(&self, domain: Domain) -> String {
        if self.in_memory {
            ":memory:".to_string()
        } else {
            self.data_dir
                .join(format!("{}.db", domain.as_str()))
                .to_string_lossy()
                .into_owned()
        }
    }

    /// Reject empty or duplicated domain lists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` describing the offending entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domains.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "databases.domains".into(),
                reason: "at least one domain must be enabled".into(),
            });
        }
        for (idx, domain) in self.domains.iter().enumerate() {
            if self.domains[..idx].contains(domain) {
                return Err(ConfigError::InvalidValue {
                    field: "databases.domains".into(),
                    reason: format!("domain '{domain}' listed twice"),
                });
            }
        }
        Ok(())
    }
}
