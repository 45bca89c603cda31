//! Storage trait for owned, flaggable resources.
//!
//! All operations are async and owner-scoped: an implementation must
//! never read or write a resource whose `owner_id` differs from the one
//! passed in. Operations documented as atomic must apply all of their
//! writes in a single transaction or none of them.

use uuid::Uuid;

use crate::error::HirelogResult;
use crate::models::resource::{CreateFlaggable, FlaggableResource, ResourceFamily, ResourceRef};

pub trait FlagStore: Send + Sync {
    /// Every resource of `family` owned by `owner_id`, in no particular order.
    fn find_by_owner(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
    ) -> impl Future<Output = HirelogResult<Vec<ResourceRef>>> + Send;

    fn get(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = HirelogResult<FlaggableResource>> + Send;

    /// Insert a new, unflagged resource.
    fn insert(
        &self,
        family: ResourceFamily,
        input: CreateFlaggable,
    ) -> impl Future<Output = HirelogResult<FlaggableResource>> + Send;

    /// Atomic: insert a new resource already flagged and clear every
    /// sibling's flag in the same transaction.
    fn insert_elected(
        &self,
        family: ResourceFamily,
        input: CreateFlaggable,
    ) -> impl Future<Output = HirelogResult<FlaggableResource>> + Send;

    fn set_flag(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        id: Uuid,
        flagged: bool,
    ) -> impl Future<Output = HirelogResult<()>> + Send;

    /// Clear the flag on every owner resource except `except`.
    fn clear_flags_except(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        except: Option<Uuid>,
    ) -> impl Future<Output = HirelogResult<()>> + Send;

    /// Atomic: clear every sibling's flag and set it on `id`.
    ///
    /// Fails with `NotFound` (and writes nothing) if `id` is not one of
    /// the owner's resources.
    fn elect(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = HirelogResult<()>> + Send;

    /// Atomic: delete `id` and, if given, elect `successor` in the same
    /// transaction.
    fn delete_by_owner_and_id(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        id: Uuid,
        successor: Option<Uuid>,
    ) -> impl Future<Output = HirelogResult<()>> + Send;

    /// Atomic bulk form of [`FlagStore::delete_by_owner_and_id`].
    fn delete_many_by_owner(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        ids: Vec<Uuid>,
        successor: Option<Uuid>,
    ) -> impl Future<Output = HirelogResult<()>> + Send;
}
