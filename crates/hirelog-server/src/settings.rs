//! Layered server configuration.
//!
//! Sources, later ones winning: built-in defaults, an optional
//! `hirelog.toml` in the working directory, then `HIRELOG__*`
//! environment variables (`HIRELOG__DATABASE__URL`,
//! `HIRELOG__ELECTION__STORAGE_TIMEOUT_MS`, ...).

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use hirelog_db::DbConfig;
use hirelog_election::ElectionConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub database: DbConfig,
    pub election: ElectionConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Fallback filter directive when `RUST_LOG` is unset.
    pub filter: String,
    /// JSON lines when true, human-readable text otherwise.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "hirelog=info".into(),
            json: true,
        }
    }
}

impl ServerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("hirelog").required(false))
                .add_source(Environment::with_prefix("HIRELOG").separator("__")),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}
