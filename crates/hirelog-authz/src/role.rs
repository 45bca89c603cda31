//! Role resolution: the single place that decides whether a role
//! bypasses permission checks.

use hirelog_core::models::caller::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleDecision {
    /// Every check passes with scope `all`.
    Bypass,
    /// Evaluate the caller's permission matrix.
    ConsultMatrix,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RoleResolver;

impl RoleResolver {
    pub fn resolve(&self, role: Role) -> RoleDecision {
        match role {
            Role::SuperAdmin => RoleDecision::Bypass,
            Role::Admin | Role::Regular => RoleDecision::ConsultMatrix,
        }
    }

    /// Resolve a raw role string, e.g. straight from a token claim.
    pub fn resolve_str(&self, raw: &str) -> RoleDecision {
        self.resolve(Role::parse_lenient(raw))
    }
}
