//! hirelog server: loads settings, prepares storage and wires the
//! authorization and election services.

mod error;
mod settings;

use hirelog_authz::PermissionEvaluator;
use hirelog_db::{DbManager, SurrealFlagStore};
use hirelog_election::{ElectionManager, FamilyHooks};
use tracing_subscriber::EnvFilter;

use crate::error::StartupError;
use crate::settings::{LogConfig, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = ServerConfig::load()?;
    init_tracing(&config.log)?;

    tracing::info!("Starting hirelog server...");

    let db = DbManager::connect_and_migrate(&config.database).await?;

    let store = SurrealFlagStore::new(db.client().clone());
    let manager = ElectionManager::new(store, config.election.clone());
    let hooks = FamilyHooks::new(manager.clone());
    // Held for the request layer.
    let _evaluator = PermissionEvaluator::default();

    tracing::info!(
        storage_timeout_ms = config.election.storage_timeout_ms,
        resume_auto_elect = hooks.resumes.family().auto_elect(),
        template_auto_elect = hooks.templates.family().auto_elect(),
        "hirelog server ready"
    );

    tokio::signal::ctrl_c().await?;

    tracing::info!(
        violations_healed = manager.violations_healed(),
        "hirelog server stopped."
    );
    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(log: &LogConfig) -> Result<(), StartupError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&log.filter)
            .map_err(|e| StartupError::LogFilter(e.to_string()))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
