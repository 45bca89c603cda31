//! Database-specific error types and conversions.

use hirelog_core::error::HirelogError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Database unreachable: {0}")]
    Unreachable(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed row: {0}")]
    InvalidRow(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for HirelogError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => HirelogError::NotFound { entity, id },
            DbError::InvalidRow(msg) => HirelogError::Internal(msg),
            other => HirelogError::StorageUnavailable(other.to_string()),
        }
    }
}
