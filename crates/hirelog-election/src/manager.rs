//! The election engine.
//!
//! Every operation for a given `(family, owner)` runs inside that key's
//! critical section, in a spawned task: a caller that gives up (request
//! cancelled, client gone) does not stop a sequence already under way.
//! Each storage call is bounded by [`ElectionConfig::storage_timeout`].

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hirelog_core::error::{HirelogError, HirelogResult};
use hirelog_core::models::resource::{
    CreateFlaggable, FlaggableResource, ResourceFamily, ResourceRef, successor,
};
use hirelog_core::repository::FlagStore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ElectionConfig;
use crate::lock::OwnerLocks;

/// Maintains "at most one flagged resource per owner" on top of a
/// [`FlagStore`].
pub struct ElectionManager<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for ElectionManager<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S> {
    store: S,
    config: ElectionConfig,
    locks: OwnerLocks,
    violations: AtomicU64,
}

impl<S: FlagStore + 'static> ElectionManager<S> {
    pub fn new(store: S, config: ElectionConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                config,
                locks: OwnerLocks::default(),
                violations: AtomicU64::new(0),
            }),
        }
    }

    /// The underlying store, for reads. Flag writes must go through the
    /// manager's operations.
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// How many times a storage read showed more than one flagged
    /// resource and the engine repaired it. Non-zero means some writer
    /// bypassed the engine or the store lost atomicity.
    pub fn violations_healed(&self) -> u64 {
        self.inner.violations.load(Ordering::Relaxed)
    }

    /// Flag `id` and clear every sibling.
    ///
    /// Idempotent: electing the already-elected resource writes nothing.
    pub async fn elect(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        id: Uuid,
    ) -> HirelogResult<()> {
        self.serialized(family, owner_id, move |inner| async move {
            let refs = inner.load(family, owner_id).await?;
            inner.elect_from(family, owner_id, id, &refs).await
        })
        .await
    }

    /// Apply the family's creation policy to a freshly inserted resource.
    ///
    /// With `auto_elect` the resource is elected at once. Without it the
    /// resource stays unflagged, unless the family must always have one
    /// elected and the owner currently has none.
    pub async fn on_create(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        id: Uuid,
        auto_elect: bool,
    ) -> HirelogResult<()> {
        self.serialized(family, owner_id, move |inner| async move {
            let refs = inner.load(family, owner_id).await?;
            if !refs.iter().any(|r| r.id == id) {
                return Err(HirelogError::resource_not_found(family, id));
            }

            if elects_on_create(family, auto_elect, &refs) {
                inner.elect_from(family, owner_id, id, &refs).await
            } else {
                debug!(%family, %owner_id, %id, "Created unflagged");
                Ok(())
            }
        })
        .await
    }

    /// Insert a resource and apply the creation policy in one store
    /// write, inside the owner's critical section. On any error nothing
    /// is stored, so a retry cannot leave a stray unflagged resource.
    pub async fn create(
        &self,
        family: ResourceFamily,
        input: CreateFlaggable,
        auto_elect: bool,
    ) -> HirelogResult<FlaggableResource> {
        let owner_id = input.owner_id;
        self.serialized(family, owner_id, move |inner| async move {
            let refs = inner.load(family, owner_id).await?;
            if elects_on_create(family, auto_elect, &refs) {
                let created = inner
                    .timed("insert_elected", inner.store.insert_elected(family, input))
                    .await?;
                debug!(%family, %owner_id, id = %created.id, "Created and elected");
                Ok(created)
            } else {
                let created = inner
                    .timed("insert", inner.store.insert(family, input))
                    .await?;
                debug!(%family, %owner_id, id = %created.id, "Created unflagged");
                Ok(created)
            }
        })
        .await
    }

    /// Delete `id`. If it was flagged, succession elects the most recent
    /// remaining sibling in the same write.
    ///
    /// Returns the resource succession elected, if any.
    pub async fn on_delete(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        id: Uuid,
    ) -> HirelogResult<Option<Uuid>> {
        self.serialized(family, owner_id, move |inner| async move {
            let refs = inner.load(family, owner_id).await?;
            let target = refs
                .iter()
                .find(|r| r.id == id)
                .ok_or_else(|| HirelogError::resource_not_found(family, id))?;

            let heir = if target.flagged {
                successor(refs.iter().filter(|r| r.id != id)).map(|r| r.id)
            } else {
                None
            };

            inner
                .timed(
                    "delete_by_owner_and_id",
                    inner.store.delete_by_owner_and_id(family, owner_id, id, heir),
                )
                .await?;

            log_succession(family, owner_id, target.flagged, heir);
            Ok(heir)
        })
        .await
    }

    /// Bulk form of [`on_delete`](Self::on_delete). Either every id is
    /// the owner's and all are deleted, or nothing is.
    pub async fn on_delete_many(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        ids: Vec<Uuid>,
    ) -> HirelogResult<Option<Uuid>> {
        self.serialized(family, owner_id, move |inner| async move {
            let refs = inner.load(family, owner_id).await?;
            let doomed: HashSet<Uuid> = ids.into_iter().collect();

            if let Some(missing) = doomed.iter().find(|id| !refs.iter().any(|r| r.id == **id)) {
                return Err(HirelogError::resource_not_found(family, *missing));
            }
            if doomed.is_empty() {
                return Ok(None);
            }

            let lost_flag = refs.iter().any(|r| r.flagged && doomed.contains(&r.id));
            let heir = if lost_flag {
                successor(refs.iter().filter(|r| !doomed.contains(&r.id))).map(|r| r.id)
            } else {
                None
            };

            inner
                .timed(
                    "delete_many_by_owner",
                    inner
                        .store
                        .delete_many_by_owner(family, owner_id, doomed.into_iter().collect(), heir),
                )
                .await?;

            log_succession(family, owner_id, lost_flag, heir);
            Ok(heir)
        })
        .await
    }

    /// Clear the flag on `id`.
    ///
    /// For families that must always have one elected, the flag passes
    /// to the most recent sibling instead; the owner's only resource
    /// stays flagged.
    pub async fn demote(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        id: Uuid,
    ) -> HirelogResult<()> {
        self.serialized(family, owner_id, move |inner| async move {
            let refs = inner.load(family, owner_id).await?;
            let target = refs
                .iter()
                .find(|r| r.id == id)
                .ok_or_else(|| HirelogError::resource_not_found(family, id))?;
            if !target.flagged {
                return Ok(());
            }

            if !family.must_elect() {
                return inner
                    .timed("set_flag", inner.store.set_flag(family, owner_id, id, false))
                    .await;
            }

            match successor(refs.iter().filter(|r| r.id != id)) {
                Some(next) => inner.elect_from(family, owner_id, next.id, &refs).await,
                None => {
                    debug!(%family, %owner_id, %id, "Sole resource stays flagged");
                    Ok(())
                }
            }
        })
        .await
    }

    /// Re-establish the invariant for one owner from whatever storage
    /// currently holds, and return the flagged resource afterwards.
    pub async fn reconcile(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
    ) -> HirelogResult<Option<Uuid>> {
        self.serialized(family, owner_id, move |inner| async move {
            let refs = inner.load(family, owner_id).await?;
            if let Some(flagged) = refs.iter().find(|r| r.flagged) {
                return Ok(Some(flagged.id));
            }
            if !family.must_elect() {
                return Ok(None);
            }

            match successor(&refs) {
                Some(next) => {
                    info!(%family, %owner_id, id = %next.id, "No flagged resource, electing most recent");
                    inner.elect_from(family, owner_id, next.id, &refs).await?;
                    Ok(Some(next.id))
                }
                None => Ok(None),
            }
        })
        .await
    }

    /// Bound a direct store call by the configured storage timeout.
    pub(crate) async fn timed<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = HirelogResult<T>>,
    ) -> HirelogResult<T> {
        self.inner.timed(operation, fut).await
    }

    /// Run `op` inside the `(family, owner)` critical section on its own
    /// task, so dropping the returned future does not abort it.
    async fn serialized<T, F, Fut>(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        op: F,
    ) -> HirelogResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<Inner<S>>) -> Fut + Send + 'static,
        Fut: Future<Output = HirelogResult<T>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _guard = inner.locks.lock(family, owner_id).await;
            op(Arc::clone(&inner)).await
        })
        .await
        .map_err(|e| HirelogError::Internal(format!("election task failed: {e}")))?
    }
}

impl<S: FlagStore> Inner<S> {
    async fn timed<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = HirelogResult<T>>,
    ) -> HirelogResult<T> {
        tokio::time::timeout(self.config.storage_timeout(), fut)
            .await
            .map_err(|_| HirelogError::StorageTimeout {
                operation,
                timeout_ms: self.config.storage_timeout_ms,
            })?
    }

    /// Read the owner's set, repairing it first if more than one
    /// resource is flagged. The most recent flagged resource keeps the
    /// flag.
    async fn load(&self, family: ResourceFamily, owner_id: Uuid) -> HirelogResult<Vec<ResourceRef>> {
        let mut refs = self
            .timed("find_by_owner", self.store.find_by_owner(family, owner_id))
            .await?;

        let flagged = refs.iter().filter(|r| r.flagged).count();
        if flagged <= 1 {
            return Ok(refs);
        }

        let violation = HirelogError::InvariantViolation {
            family,
            owner_id,
            flagged,
        };
        self.violations.fetch_add(1, Ordering::Relaxed);

        let Some(keep) = successor(refs.iter().filter(|r| r.flagged)).map(|r| r.id) else {
            return Ok(refs);
        };
        warn!(error = %violation, keep = %keep, "Healing singleton flag violation");

        self.timed(
            "clear_flags_except",
            self.store.clear_flags_except(family, owner_id, Some(keep)),
        )
        .await?;

        for r in &mut refs {
            r.flagged = r.id == keep;
        }
        Ok(refs)
    }

    async fn elect_from(
        &self,
        family: ResourceFamily,
        owner_id: Uuid,
        id: Uuid,
        refs: &[ResourceRef],
    ) -> HirelogResult<()> {
        let target = refs
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| HirelogError::resource_not_found(family, id))?;

        // `load` guarantees at most one flagged entry.
        if target.flagged {
            debug!(%family, %owner_id, %id, "Already elected");
            return Ok(());
        }

        self.timed("elect", self.store.elect(family, owner_id, id))
            .await?;
        debug!(%family, %owner_id, %id, "Elected");
        Ok(())
    }
}

/// A new resource is elected when the caller asks for it, or when the
/// family must always have one flagged and the owner has none.
fn elects_on_create(family: ResourceFamily, auto_elect: bool, refs: &[ResourceRef]) -> bool {
    auto_elect || (family.must_elect() && !refs.iter().any(|r| r.flagged))
}

fn log_succession(family: ResourceFamily, owner_id: Uuid, lost_flag: bool, heir: Option<Uuid>) {
    match (lost_flag, heir) {
        (true, Some(heir)) => debug!(%family, %owner_id, %heir, "Succession elected sibling"),
        (true, None) => debug!(%family, %owner_id, "Flagged resource deleted, none remain"),
        (false, _) => debug!(%family, %owner_id, "Deleted unflagged resource"),
    }
}
