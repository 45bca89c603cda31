//! Integration tests for [`SurrealFlagStore`] using in-memory SurrealDB.

use chrono::{TimeZone, Utc};
use hirelog_core::error::HirelogError;
use hirelog_core::models::resource::{CreateFlaggable, FlaggableResource, ResourceFamily};
use hirelog_core::repository::FlagStore;
use hirelog_db::SurrealFlagStore;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> SurrealFlagStore<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    hirelog_db::run_migrations(&db).await.unwrap();
    SurrealFlagStore::new(db)
}

async fn insert(
    store: &SurrealFlagStore<Db>,
    family: ResourceFamily,
    owner_id: Uuid,
    name: &str,
) -> FlaggableResource {
    store
        .insert(
            family,
            CreateFlaggable {
                owner_id,
                name: name.into(),
                created_at: None,
            },
        )
        .await
        .unwrap()
}

async fn flagged_ids(store: &SurrealFlagStore<Db>, family: ResourceFamily, owner_id: Uuid) -> Vec<Uuid> {
    store
        .find_by_owner(family, owner_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.flagged)
        .map(|r| r.id)
        .collect()
}

// -----------------------------------------------------------------------
// Insert / read
// -----------------------------------------------------------------------

#[tokio::test]
async fn insert_elected_takes_flag_from_siblings() {
    let store = setup().await;
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();

    let old = insert(&store, ResourceFamily::Resume, owner, "old").await;
    store.elect(ResourceFamily::Resume, owner, old.id).await.unwrap();
    let theirs = insert(&store, ResourceFamily::Resume, other, "theirs").await;
    store.elect(ResourceFamily::Resume, other, theirs.id).await.unwrap();

    let new = store
        .insert_elected(
            ResourceFamily::Resume,
            CreateFlaggable {
                owner_id: owner,
                name: "new".into(),
                created_at: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
            },
        )
        .await
        .unwrap();

    assert!(new.flagged);
    assert_eq!(new.owner_id, owner);
    assert_eq!(flagged_ids(&store, ResourceFamily::Resume, owner).await, vec![new.id]);
    assert_eq!(flagged_ids(&store, ResourceFamily::Resume, other).await, vec![theirs.id]);
}

#[tokio::test]
async fn insert_elected_for_first_resource() {
    let store = setup().await;
    let owner = Uuid::new_v4();

    let only = store
        .insert_elected(
            ResourceFamily::Template,
            CreateFlaggable {
                owner_id: owner,
                name: "intro".into(),
                created_at: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(flagged_ids(&store, ResourceFamily::Template, owner).await, vec![only.id]);
}

#[tokio::test]
async fn insert_is_unflagged_and_readable() {
    let store = setup().await;
    let owner = Uuid::new_v4();

    let resume = insert(&store, ResourceFamily::Resume, owner, "cv-2024.pdf").await;
    assert_eq!(resume.owner_id, owner);
    assert_eq!(resume.family, ResourceFamily::Resume);
    assert!(!resume.flagged);

    let fetched = store.get(ResourceFamily::Resume, owner, resume.id).await.unwrap();
    assert_eq!(fetched.id, resume.id);
    assert_eq!(fetched.name, "cv-2024.pdf");
}

#[tokio::test]
async fn insert_honours_backdated_created_at() {
    let store = setup().await;
    let owner = Uuid::new_v4();
    let when = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let template = store
        .insert(
            ResourceFamily::Template,
            CreateFlaggable {
                owner_id: owner,
                name: "follow-up".into(),
                created_at: Some(when),
            },
        )
        .await
        .unwrap();

    assert_eq!(template.created_at, when);
}

#[tokio::test]
async fn reads_are_owner_scoped() {
    let store = setup().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let resume = insert(&store, ResourceFamily::Resume, alice, "alice.pdf").await;
    insert(&store, ResourceFamily::Resume, bob, "bob.pdf").await;

    let err = store
        .get(ResourceFamily::Resume, bob, resume.id)
        .await
        .unwrap_err();
    assert!(matches!(err, HirelogError::NotFound { .. }));

    assert_eq!(store.find_by_owner(ResourceFamily::Resume, alice).await.unwrap().len(), 1);
    assert_eq!(store.find_by_owner(ResourceFamily::Resume, bob).await.unwrap().len(), 1);
}

#[tokio::test]
async fn families_are_separate_tables() {
    let store = setup().await;
    let owner = Uuid::new_v4();

    insert(&store, ResourceFamily::Resume, owner, "cv.pdf").await;

    assert!(store
        .find_by_owner(ResourceFamily::Template, owner)
        .await
        .unwrap()
        .is_empty());
}

// -----------------------------------------------------------------------
// Flag writes
// -----------------------------------------------------------------------

#[tokio::test]
async fn elect_clears_siblings() {
    let store = setup().await;
    let owner = Uuid::new_v4();

    let a = insert(&store, ResourceFamily::Template, owner, "a").await;
    let b = insert(&store, ResourceFamily::Template, owner, "b").await;

    store.elect(ResourceFamily::Template, owner, a.id).await.unwrap();
    assert_eq!(flagged_ids(&store, ResourceFamily::Template, owner).await, vec![a.id]);

    store.elect(ResourceFamily::Template, owner, b.id).await.unwrap();
    assert_eq!(flagged_ids(&store, ResourceFamily::Template, owner).await, vec![b.id]);
}

#[tokio::test]
async fn elect_foreign_resource_writes_nothing() {
    let store = setup().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let mine = insert(&store, ResourceFamily::Resume, alice, "mine").await;
    let theirs = insert(&store, ResourceFamily::Resume, bob, "theirs").await;
    store.elect(ResourceFamily::Resume, alice, mine.id).await.unwrap();

    let err = store
        .elect(ResourceFamily::Resume, alice, theirs.id)
        .await
        .unwrap_err();
    assert!(matches!(err, HirelogError::NotFound { .. }));

    assert_eq!(flagged_ids(&store, ResourceFamily::Resume, alice).await, vec![mine.id]);
    assert!(flagged_ids(&store, ResourceFamily::Resume, bob).await.is_empty());
}

#[tokio::test]
async fn set_flag_and_clear_flags_except() {
    let store = setup().await;
    let owner = Uuid::new_v4();

    let a = insert(&store, ResourceFamily::Template, owner, "a").await;
    let b = insert(&store, ResourceFamily::Template, owner, "b").await;

    store.set_flag(ResourceFamily::Template, owner, a.id, true).await.unwrap();
    store.set_flag(ResourceFamily::Template, owner, b.id, true).await.unwrap();
    assert_eq!(flagged_ids(&store, ResourceFamily::Template, owner).await.len(), 2);

    store
        .clear_flags_except(ResourceFamily::Template, owner, Some(b.id))
        .await
        .unwrap();
    assert_eq!(flagged_ids(&store, ResourceFamily::Template, owner).await, vec![b.id]);

    store
        .clear_flags_except(ResourceFamily::Template, owner, None)
        .await
        .unwrap();
    assert!(flagged_ids(&store, ResourceFamily::Template, owner).await.is_empty());
}

#[tokio::test]
async fn set_flag_on_missing_resource_is_not_found() {
    let store = setup().await;
    let err = store
        .set_flag(ResourceFamily::Resume, Uuid::new_v4(), Uuid::new_v4(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, HirelogError::NotFound { .. }));
}

// -----------------------------------------------------------------------
// Deletes
// -----------------------------------------------------------------------

#[tokio::test]
async fn delete_with_successor_is_one_write() {
    let store = setup().await;
    let owner = Uuid::new_v4();

    let a = insert(&store, ResourceFamily::Resume, owner, "a").await;
    let b = insert(&store, ResourceFamily::Resume, owner, "b").await;
    store.elect(ResourceFamily::Resume, owner, a.id).await.unwrap();

    store
        .delete_by_owner_and_id(ResourceFamily::Resume, owner, a.id, Some(b.id))
        .await
        .unwrap();

    let remaining = store.find_by_owner(ResourceFamily::Resume, owner).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, b.id);
    assert!(remaining[0].flagged);
}

#[tokio::test]
async fn delete_is_owner_scoped() {
    let store = setup().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let theirs = insert(&store, ResourceFamily::Template, bob, "theirs").await;

    store
        .delete_by_owner_and_id(ResourceFamily::Template, alice, theirs.id, None)
        .await
        .unwrap();

    assert!(store.get(ResourceFamily::Template, bob, theirs.id).await.is_ok());
}

#[tokio::test]
async fn delete_many_removes_only_listed_ids() {
    let store = setup().await;
    let owner = Uuid::new_v4();

    let a = insert(&store, ResourceFamily::Template, owner, "a").await;
    let b = insert(&store, ResourceFamily::Template, owner, "b").await;
    let c = insert(&store, ResourceFamily::Template, owner, "c").await;

    store
        .delete_many_by_owner(ResourceFamily::Template, owner, vec![a.id, b.id], Some(c.id))
        .await
        .unwrap();

    let remaining = store.find_by_owner(ResourceFamily::Template, owner).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, c.id);
    assert!(remaining[0].flagged);

    store
        .delete_many_by_owner(ResourceFamily::Template, owner, Vec::new(), None)
        .await
        .unwrap();
}
