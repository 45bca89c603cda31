//! Election engine configuration.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElectionConfig {
    /// Upper bound for every storage call the engine makes
    /// (default: 5000). Expiry fails the operation without retrying.
    pub storage_timeout_ms: u64,
}

impl ElectionConfig {
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            storage_timeout_ms: 5_000,
        }
    }
}
