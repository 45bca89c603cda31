//! Permission evaluation: `(caller, module, action) -> (allowed, scope)`.
//!
//! Evaluation is a pure function of the caller and its permission
//! matrix. Denial is an ordinary [`Decision`], not an error; callers
//! that want an error use [`PermissionEvaluator::require`].

use hirelog_core::models::caller::Caller;
use hirelog_core::models::permission::{Action, Module, Scope};
use tracing::debug;

use crate::error::AuthzError;
use crate::role::{RoleDecision, RoleResolver};

/// Outcome of a permission check.
///
/// `scope` is what the caller applies to the follow-up query: `Own`
/// restricts to `owner_id == caller.id`. For `create` and `delete` the
/// scope carries no meaning and is `Own` by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub scope: Scope,
}

impl Decision {
    pub const DENY: Decision = Decision {
        allowed: false,
        scope: Scope::None,
    };

    pub const BYPASS: Decision = Decision {
        allowed: true,
        scope: Scope::All,
    };

    fn from_flag(granted: bool) -> Self {
        if granted {
            Decision {
                allowed: true,
                scope: Scope::Own,
            }
        } else {
            Decision::DENY
        }
    }

    fn from_scope(scope: Scope) -> Self {
        match scope {
            Scope::None => Decision::DENY,
            scope => Decision {
                allowed: true,
                scope,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionEvaluator {
    resolver: RoleResolver,
}

impl PermissionEvaluator {
    pub fn new(resolver: RoleResolver) -> Self {
        Self { resolver }
    }

    /// Check by module name as it arrives from the request layer.
    ///
    /// An unknown module name fails closed with
    /// [`AuthzError::UnknownModule`], regardless of role.
    pub fn check(
        &self,
        caller: &Caller,
        module: &str,
        action: Action,
    ) -> Result<Decision, AuthzError> {
        let module = module
            .parse::<Module>()
            .map_err(|_| AuthzError::UnknownModule(module.to_string()))?;
        Ok(self.check_module(caller, module, action))
    }

    /// Like [`check`](Self::check) with the action also given as a string.
    pub fn check_str(
        &self,
        caller: &Caller,
        module: &str,
        action: &str,
    ) -> Result<Decision, AuthzError> {
        let action = action
            .parse::<Action>()
            .map_err(|_| AuthzError::UnknownAction(action.to_string()))?;
        self.check(caller, module, action)
    }

    pub fn check_module(&self, caller: &Caller, module: Module, action: Action) -> Decision {
        if self.resolver.resolve(caller.role) == RoleDecision::Bypass {
            return Decision::BYPASS;
        }

        let Some(record) = caller.permissions.get(module).filter(|r| r.is_enabled()) else {
            debug!(caller_id = %caller.id, %module, %action, "module not enabled for caller");
            return Decision::DENY;
        };

        let decision = match action {
            Action::Create => Decision::from_flag(record.create),
            Action::Delete => Decision::from_flag(record.delete),
            Action::Read => Decision::from_scope(record.read),
            Action::Edit => Decision::from_scope(record.edit),
        };

        if !decision.allowed {
            debug!(caller_id = %caller.id, %module, %action, "permission denied");
        }
        decision
    }

    /// Check and convert a denial into [`AuthzError::Denied`].
    ///
    /// Returns the scope to apply to the follow-up query.
    pub fn require(
        &self,
        caller: &Caller,
        module: Module,
        action: Action,
    ) -> Result<Scope, AuthzError> {
        let decision = self.check_module(caller, module, action);
        if decision.allowed {
            Ok(decision.scope)
        } else {
            Err(AuthzError::Denied { module, action })
        }
    }
}

#[cfg(test)]
mod tests {
    use hirelog_core::models::caller::Role;
    use hirelog_core::models::permission::{Access, PermissionMatrix, PermissionRecord};
    use uuid::Uuid;

    use super::*;

    fn caller(role: Role, module: Module, record: PermissionRecord) -> Caller {
        Caller::new(Uuid::new_v4(), role, PermissionMatrix::new().with(module, record))
    }

    #[test]
    fn regular_reader_gets_own_scope() {
        let c = caller(
            Role::Regular,
            Module::Resumes,
            PermissionRecord {
                access: Access::Enabled,
                read: Scope::Own,
                ..Default::default()
            },
        );
        let evaluator = PermissionEvaluator::default();
        assert_eq!(
            evaluator.check(&c, "resumes", Action::Read).unwrap(),
            Decision {
                allowed: true,
                scope: Scope::Own
            }
        );
        assert_eq!(
            evaluator.check(&c, "resumes", Action::Edit).unwrap(),
            Decision::DENY
        );
    }

    #[test]
    fn create_and_delete_report_own_scope() {
        let c = caller(
            Role::Admin,
            Module::Templates,
            PermissionRecord {
                access: Access::Enabled,
                create: true,
                delete: true,
                ..Default::default()
            },
        );
        let evaluator = PermissionEvaluator::default();
        for action in [Action::Create, Action::Delete] {
            assert_eq!(
                evaluator.check_module(&c, Module::Templates, action),
                Decision {
                    allowed: true,
                    scope: Scope::Own
                }
            );
        }
    }

    #[test]
    fn unknown_module_fails_closed_even_for_super_admin() {
        let c = Caller::new(Uuid::new_v4(), Role::SuperAdmin, PermissionMatrix::new());
        let evaluator = PermissionEvaluator::default();
        assert_eq!(
            evaluator.check(&c, "payroll", Action::Read),
            Err(AuthzError::UnknownModule("payroll".into()))
        );
    }

    #[test]
    fn unknown_action_string_is_rejected() {
        let c = Caller::new(Uuid::new_v4(), Role::SuperAdmin, PermissionMatrix::new());
        let evaluator = PermissionEvaluator::default();
        assert_eq!(
            evaluator.check_str(&c, "resumes", "publish"),
            Err(AuthzError::UnknownAction("publish".into()))
        );
        assert_eq!(
            evaluator.check_str(&c, "resumes", "read"),
            Ok(Decision::BYPASS)
        );
    }

    #[test]
    fn require_turns_denial_into_error() {
        let c = caller(Role::Regular, Module::Analytics, PermissionRecord::default());
        let evaluator = PermissionEvaluator::default();
        assert_eq!(
            evaluator.require(&c, Module::Analytics, Action::Read),
            Err(AuthzError::Denied {
                module: Module::Analytics,
                action: Action::Read
            })
        );
    }
}
