//! Per-module permission records.
//!
//! Records arrive from the identity store as loosely-typed JSON. Every
//! field is parsed leniently: anything missing or unrecognized becomes
//! the most restrictive value, so a malformed record can only deny.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::HirelogError;

/// A functional area with its own permission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Module {
    HrDirectory,
    Templates,
    Resumes,
    Analytics,
}

impl Module {
    pub const ALL: [Module; 4] = [
        Module::HrDirectory,
        Module::Templates,
        Module::Resumes,
        Module::Analytics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Module::HrDirectory => "hrDirectory",
            Module::Templates => "templates",
            Module::Resumes => "resumes",
            Module::Analytics => "analytics",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = HirelogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| HirelogError::UnknownModule(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Edit,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Edit, Action::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = HirelogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| HirelogError::UnknownAction(s.to_string()))
    }
}

/// Module-level switch. Anything other than `Enabled` denies every action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Access {
    Enabled,
    Disabled,
    #[default]
    NotSet,
}

impl Access {
    fn parse_lenient(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str).map(str::to_ascii_lowercase) {
            Some(s) if s == "enabled" => Access::Enabled,
            Some(s) if s == "disabled" => Access::Disabled,
            _ => Access::NotSet,
        }
    }
}

/// Breadth of data a read or edit grant covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    All,
    Own,
    #[default]
    None,
}

impl Scope {
    fn parse_lenient(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str).map(str::to_ascii_lowercase) {
            Some(s) if s == "all" => Scope::All,
            Some(s) if s == "own" => Scope::Own,
            _ => Scope::None,
        }
    }

    /// Owner restriction a query must apply for this scope.
    ///
    /// `All` needs no filter; `Own` and `None` both restrict to the
    /// caller. `None` never reaches a query in practice because the
    /// evaluator denies it first.
    pub fn owner_filter<T>(self, caller_id: T) -> Option<T> {
        match self {
            Scope::All => None,
            Scope::Own | Scope::None => Some(caller_id),
        }
    }
}

/// Capabilities a caller holds on a single module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct PermissionRecord {
    pub access: Access,
    pub create: bool,
    pub read: Scope,
    pub edit: Scope,
    pub delete: bool,
}

impl PermissionRecord {
    pub fn is_enabled(&self) -> bool {
        self.access == Access::Enabled
    }
}

impl From<Value> for PermissionRecord {
    fn from(value: Value) -> Self {
        let Value::Object(fields) = value else {
            return Self::default();
        };
        // Only a literal JSON `true` grants; strings like "true" do not.
        let flag = |key: &str| matches!(fields.get(key), Some(Value::Bool(true)));
        Self {
            access: Access::parse_lenient(fields.get("access")),
            create: flag("create"),
            read: Scope::parse_lenient(fields.get("read")),
            edit: Scope::parse_lenient(fields.get("edit")),
            delete: flag("delete"),
        }
    }
}

/// Static shape of a caller's per-module permission records.
///
/// Serializes as the same module-keyed object it is loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "BTreeMap<Module, PermissionRecord>")]
pub struct PermissionMatrix {
    records: BTreeMap<Module, PermissionRecord>,
}

impl PermissionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for wiring and tests.
    pub fn with(mut self, module: Module, record: PermissionRecord) -> Self {
        self.records.insert(module, record);
        self
    }

    pub fn insert(&mut self, module: Module, record: PermissionRecord) {
        self.records.insert(module, record);
    }

    pub fn get(&self, module: Module) -> Option<&PermissionRecord> {
        self.records.get(&module)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Module, &PermissionRecord)> {
        self.records.iter().map(|(m, r)| (*m, r))
    }

    /// Load a matrix from the identity store's JSON permission object.
    ///
    /// Unknown module keys are dropped; a non-object value yields an
    /// empty matrix, which denies everything.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(entries) = value else {
            warn!("permission object is not a JSON object, denying all modules");
            return Self::default();
        };

        let mut matrix = Self::default();
        for (key, raw) in entries {
            match key.parse::<Module>() {
                Ok(module) => matrix.insert(module, PermissionRecord::from(raw)),
                Err(_) => warn!(module = %key, "dropping permission record for unknown module"),
            }
        }
        matrix
    }
}

impl From<Value> for PermissionMatrix {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl From<PermissionMatrix> for BTreeMap<Module, PermissionRecord> {
    fn from(matrix: PermissionMatrix) -> Self {
        matrix.records
    }
}
