//! Per-owner critical sections.
//!
//! One async mutex per `(family, owner)` key, created on demand and
//! dropped again once nobody holds or waits on it. Distinct owners never
//! contend.

use std::sync::Arc;

use dashmap::DashMap;
use hirelog_core::models::resource::ResourceFamily;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type Key = (ResourceFamily, Uuid);

#[derive(Debug, Default)]
pub(crate) struct OwnerLocks {
    locks: DashMap<Key, Arc<Mutex<()>>>,
}

impl OwnerLocks {
    pub(crate) async fn lock(&self, family: ResourceFamily, owner_id: Uuid) -> OwnerGuard<'_> {
        let key = (family, owner_id);
        // Clone out of the map so no shard lock is held across the await.
        let mutex = Arc::clone(&*self.locks.entry(key).or_default());
        let guard = mutex.lock_owned().await;
        OwnerGuard {
            locks: self,
            key,
            guard: Some(guard),
        }
    }

    /// Keys currently held or awaited.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

pub(crate) struct OwnerGuard<'a> {
    locks: &'a OwnerLocks,
    key: Key,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left: nobody holds or waits.
        self.locks
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
