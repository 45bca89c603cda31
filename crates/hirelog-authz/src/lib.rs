//! hirelog authz: role resolution and per-module permission
//! evaluation.
//!
//! Authentication happens upstream; everything here works on an
//! already verified [`Caller`](hirelog_core::models::caller::Caller).

pub mod error;
pub mod evaluator;
pub mod role;

pub use error::AuthzError;
pub use evaluator::{Decision, PermissionEvaluator};
pub use role::{RoleDecision, RoleResolver};
