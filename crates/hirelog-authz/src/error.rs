//! Authorization error types.

use hirelog_core::error::HirelogError;
use hirelog_core::models::permission::{Action, Module};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unknown module: {0}")]
    UnknownModule(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("{action} on {module} is not permitted")]
    Denied { module: Module, action: Action },
}

impl From<AuthzError> for HirelogError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::UnknownModule(name) => HirelogError::UnknownModule(name),
            AuthzError::UnknownAction(name) => HirelogError::UnknownAction(name),
            AuthzError::Denied { module, action } => HirelogError::PermissionDenied {
                module: module.to_string(),
                action: action.to_string(),
            },
        }
    }
}
