//! Error types for the hirelog core.

use thiserror::Error;
use uuid::Uuid;

use crate::models::resource::ResourceFamily;

#[derive(Debug, Error)]
pub enum HirelogError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Permission denied: {action} on {module}")]
    PermissionDenied { module: String, action: String },

    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// More than one flagged resource observed for an owner. Internal only:
    /// the election engine heals it and logs instead of returning it.
    #[error("Invariant violation: {flagged} flagged {family} resources for owner {owner_id}")]
    InvariantViolation {
        family: ResourceFamily,
        owner_id: Uuid,
        flagged: usize,
    },

    #[error("Storage operation `{operation}` timed out after {timeout_ms}ms")]
    StorageTimeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HirelogError {
    /// Shorthand for a missing resource of the given family.
    pub fn resource_not_found(family: ResourceFamily, id: Uuid) -> Self {
        Self::NotFound {
            entity: family.as_str().into(),
            id: id.to_string(),
        }
    }

    /// Whether the caller may retry the failed operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StorageTimeout { .. } | Self::StorageUnavailable(_)
        )
    }
}

pub type HirelogResult<T> = Result<T, HirelogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_storage_failures_are_retryable() {
        assert!(
            HirelogError::StorageTimeout {
                operation: "elect",
                timeout_ms: 10
            }
            .is_retryable()
        );
        assert!(HirelogError::StorageUnavailable("down".into()).is_retryable());
        assert!(
            !HirelogError::PermissionDenied {
                module: "resumes".into(),
                action: "read".into()
            }
            .is_retryable()
        );
        assert!(!HirelogError::resource_not_found(ResourceFamily::Resume, Uuid::nil()).is_retryable());
    }

    #[test]
    fn not_found_names_the_family() {
        let err = HirelogError::resource_not_found(ResourceFamily::Template, Uuid::nil());
        assert_eq!(
            err.to_string(),
            format!("Entity not found: template with id {}", Uuid::nil())
        );
    }
}
