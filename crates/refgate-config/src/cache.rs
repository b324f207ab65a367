//! Reference cache configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default entry lifetime, in seconds.
const fn default_ttl_secs() -> u64 {
    300
}

const fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum age of a cached master record before it must be re-read.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// When false every lookup goes to the owning domain.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            enabled: default_enabled(),
        }
    }
}

impl CacheConfig {
    /// Effective TTL. A disabled cache behaves as a zero TTL.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        if self.enabled {
            Duration::from_secs(self.ttl_secs)
        } else {
            Duration::ZERO
        }
    }
}
