//! hirelog database: SurrealDB connection management, schema
//! migrations and the [`FlagStore`](hirelog_core::repository::FlagStore)
//! implementation.

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::SurrealFlagStore;
pub use schema::{run_migrations, schema_v1};
