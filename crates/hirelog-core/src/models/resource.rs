//! Owned, flaggable resources (resumes and templates).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A family of owned resources where at most one per owner is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFamily {
    /// Flag: `is_active`.
    Resume,
    /// Flag: `is_default`.
    Template,
}

impl ResourceFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceFamily::Resume => "resume",
            ResourceFamily::Template => "template",
        }
    }

    /// Storage table holding this family.
    pub fn table(self) -> &'static str {
        self.as_str()
    }

    /// Storage field holding the singleton flag.
    pub fn flag_field(self) -> &'static str {
        match self {
            ResourceFamily::Resume => "is_active",
            ResourceFamily::Template => "is_default",
        }
    }

    /// Whether a newly created resource is elected immediately.
    pub fn auto_elect(self) -> bool {
        matches!(self, ResourceFamily::Resume)
    }

    /// Whether an owner with at least one resource must always have
    /// exactly one flagged.
    pub fn must_elect(self) -> bool {
        matches!(self, ResourceFamily::Resume)
    }
}

impl fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The slice of a resource the election engine reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRef {
    pub id: Uuid,
    pub flagged: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggableResource {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub family: ResourceFamily,
    pub name: String,
    pub flagged: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner-scoped insert. Resources are always stored unflagged; the
/// election engine decides the flag afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFlaggable {
    pub owner_id: Uuid,
    pub name: String,
    /// Backdated creation time for imports. `None` = now.
    pub created_at: Option<DateTime<Utc>>,
}

/// Pick the resource succession should elect: most recent `created_at`,
/// ties broken by the highest id.
pub fn successor<'a, I>(candidates: I) -> Option<&'a ResourceRef>
where
    I: IntoIterator<Item = &'a ResourceRef>,
{
    candidates
        .into_iter()
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
}
