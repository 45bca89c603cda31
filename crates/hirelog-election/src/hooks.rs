//! Lifecycle hooks the request layer calls after every mutation of a
//! flaggable resource.
//!
//! Each hook binds one [`ResourceFamily`] to the shared
//! [`ElectionManager`] together with that family's creation policy, so
//! single deletes, bulk deletes and flag updates all pass through the
//! same invariant logic.

use hirelog_core::error::HirelogResult;
use hirelog_core::models::resource::{CreateFlaggable, FlaggableResource, ResourceFamily};
use hirelog_core::repository::FlagStore;
use uuid::Uuid;

use crate::manager::ElectionManager;

pub struct LifecycleHooks<S> {
    manager: ElectionManager<S>,
    family: ResourceFamily,
    auto_elect: bool,
}

impl<S> Clone for LifecycleHooks<S> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            family: self.family,
            auto_elect: self.auto_elect,
        }
    }
}

impl<S: FlagStore + 'static> LifecycleHooks<S> {
    pub fn new(manager: ElectionManager<S>, family: ResourceFamily) -> Self {
        Self {
            manager,
            family,
            auto_elect: family.auto_elect(),
        }
    }

    /// Newly uploaded resumes become active.
    pub fn resumes(manager: ElectionManager<S>) -> Self {
        Self::new(manager, ResourceFamily::Resume)
    }

    /// Templates start unflagged unless the caller asks for default.
    pub fn templates(manager: ElectionManager<S>) -> Self {
        Self::new(manager, ResourceFamily::Template)
    }

    pub fn family(&self) -> ResourceFamily {
        self.family
    }

    /// Insert a resource and apply the creation policy atomically.
    /// `make_flagged` requests the flag even when the family does not
    /// auto-elect.
    pub async fn create(
        &self,
        input: CreateFlaggable,
        make_flagged: bool,
    ) -> HirelogResult<FlaggableResource> {
        self.manager
            .create(self.family, input, self.auto_elect || make_flagged)
            .await
    }

    /// Creation policy for a resource the caller already inserted.
    pub async fn after_create(
        &self,
        owner_id: Uuid,
        id: Uuid,
        make_flagged: bool,
    ) -> HirelogResult<()> {
        self.manager
            .on_create(self.family, owner_id, id, self.auto_elect || make_flagged)
            .await
    }

    /// `Some(true)` elects, `Some(false)` demotes, `None` leaves the
    /// flag alone but still fails for a foreign id.
    pub async fn after_update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        requested_flag: Option<bool>,
    ) -> HirelogResult<()> {
        match requested_flag {
            Some(true) => self.manager.elect(self.family, owner_id, id).await,
            Some(false) => self.manager.demote(self.family, owner_id, id).await,
            None => self
                .manager
                .timed("get", self.manager.store().get(self.family, owner_id, id))
                .await
                .map(|_| ()),
        }
    }

    pub async fn elect(&self, owner_id: Uuid, id: Uuid) -> HirelogResult<()> {
        self.manager.elect(self.family, owner_id, id).await
    }

    /// Returns the sibling succession elected, if any.
    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> HirelogResult<Option<Uuid>> {
        self.manager.on_delete(self.family, owner_id, id).await
    }

    pub async fn delete_many(
        &self,
        owner_id: Uuid,
        ids: Vec<Uuid>,
    ) -> HirelogResult<Option<Uuid>> {
        self.manager.on_delete_many(self.family, owner_id, ids).await
    }
}

/// Hooks for every flaggable family, sharing one manager.
pub struct FamilyHooks<S> {
    pub resumes: LifecycleHooks<S>,
    pub templates: LifecycleHooks<S>,
}

impl<S: FlagStore + 'static> FamilyHooks<S> {
    pub fn new(manager: ElectionManager<S>) -> Self {
        Self {
            resumes: LifecycleHooks::resumes(manager.clone()),
            templates: LifecycleHooks::templates(manager),
        }
    }

    pub fn for_family(&self, family: ResourceFamily) -> &LifecycleHooks<S> {
        match family {
            ResourceFamily::Resume => &self.resumes,
            ResourceFamily::Template => &self.templates,
        }
    }
}
