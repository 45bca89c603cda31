//! SurrealDB connection management.

use std::time::Duration;

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::{info, warn};

use crate::error::DbError;
use crate::schema::run_migrations;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// WebSocket endpoint, `host:port`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root sign-in. Leave `username` empty for servers started
    /// `--unauthenticated`.
    pub username: String,
    pub password: String,
    /// Bound on reaching the server and signing in.
    pub connect_timeout_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "hirelog".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
            connect_timeout_ms: 10_000,
        }
    }
}

/// Owns the client handle shared by every store.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let db = tokio::time::timeout(timeout, Self::open(config))
            .await
            .map_err(|_| {
                DbError::Unreachable(format!(
                    "{} did not answer within {}ms",
                    config.url, config.connect_timeout_ms
                ))
            })??;

        info!(url = %config.url, "Connected to SurrealDB");
        Ok(Self { db })
    }

    /// Connect, then bring the schema up to date.
    pub async fn connect_and_migrate(config: &DbConfig) -> Result<Self, DbError> {
        let manager = Self::connect(config).await?;
        let applied = run_migrations(&manager.db).await?;
        if !applied.is_empty() {
            info!(?applied, "Schema migrated");
        }
        Ok(manager)
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }

    async fn open(config: &DbConfig) -> Result<Surreal<Client>, DbError> {
        let db = Surreal::new::<Ws>(&config.url).await?;

        if config.username.is_empty() {
            warn!("No database credentials configured, skipping sign-in");
        } else {
            db.signin(Root {
                username: config.username.clone(),
                password: config.password.clone(),
            })
            .await?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;
        Ok(db)
    }
}
