//! Verified caller identity handed to the core by the request layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::permission::PermissionMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Regular,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Parse a role string from the identity store.
    ///
    /// Matching ignores case and `-`/`_` separators. Unrecognized
    /// values resolve to `Regular`, the least privileged role.
    pub fn parse_lenient(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "superadmin" => Role::SuperAdmin,
            "admin" => Role::Admin,
            _ => Role::Regular,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Regular => "REGULAR",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable for the duration of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub id: Uuid,
    pub role: Role,
    #[serde(default)]
    pub permissions: PermissionMatrix,
}

impl Caller {
    pub fn new(id: Uuid, role: Role, permissions: PermissionMatrix) -> Self {
        Self {
            id,
            role,
            permissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_collapses_spellings() {
        for raw in ["SUPER_ADMIN", "super_admin", "superadmin", "Super-Admin"] {
            assert_eq!(Role::parse_lenient(raw), Role::SuperAdmin, "{raw}");
        }
        for raw in ["ADMIN", "admin", "Admin"] {
            assert_eq!(Role::parse_lenient(raw), Role::Admin, "{raw}");
        }
        for raw in ["REGULAR", "user", "", "root", "superadmins"] {
            assert_eq!(Role::parse_lenient(raw), Role::Regular, "{raw}");
        }
    }

    #[test]
    fn caller_deserializes_without_permissions() {
        let caller: Caller = serde_json::from_value(serde_json::json!({
            "id": Uuid::nil(),
            "role": "ADMIN",
        }))
        .unwrap();
        assert_eq!(caller.role, Role::Admin);
        assert_eq!(caller.permissions.iter().count(), 0);
    }

    #[test]
    fn caller_keeps_permissions_across_serde() {
        use crate::models::permission::{Access, Module, PermissionRecord, Scope};

        let caller = Caller::new(
            Uuid::new_v4(),
            Role::Regular,
            PermissionMatrix::new().with(
                Module::Resumes,
                PermissionRecord {
                    access: Access::Enabled,
                    read: Scope::Own,
                    ..Default::default()
                },
            ),
        );

        let value = serde_json::to_value(&caller).unwrap();
        let back: Caller = serde_json::from_value(value).unwrap();

        assert_eq!(back.id, caller.id);
        assert_eq!(back.permissions, caller.permissions);
        assert_eq!(
            back.permissions.get(Module::Resumes).map(|r| r.read),
            Some(Scope::Own)
        );
    }
}
