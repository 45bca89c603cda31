//! Integration tests for the resume and template lifecycle hooks.

use hirelog_core::error::HirelogError;
use hirelog_core::models::resource::{CreateFlaggable, ResourceFamily};
use hirelog_core::repository::FlagStore;
use hirelog_db::SurrealFlagStore;
use hirelog_election::{ElectionConfig, ElectionManager, FamilyHooks};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Store = SurrealFlagStore<Db>;

/// Hooks plus a second handle on the same database for assertions.
async fn setup() -> (FamilyHooks<Store>, Store) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    hirelog_db::run_migrations(&db).await.unwrap();
    let store = SurrealFlagStore::new(db);
    let manager = ElectionManager::new(store.clone(), ElectionConfig::default());
    (FamilyHooks::new(manager), store)
}

fn named(owner_id: Uuid, name: &str) -> CreateFlaggable {
    CreateFlaggable {
        owner_id,
        name: name.into(),
        created_at: None,
    }
}

#[tokio::test]
async fn uploaded_resumes_become_active() {
    let (hooks, store) = setup().await;
    let owner = Uuid::new_v4();

    let first = hooks.resumes.create(named(owner, "v1"), false).await.unwrap();
    assert!(first.flagged);
    assert_eq!(first.family, ResourceFamily::Resume);

    let second = hooks.resumes.create(named(owner, "v2"), false).await.unwrap();
    assert!(second.flagged);

    let first = store.get(ResourceFamily::Resume, owner, first.id).await.unwrap();
    assert!(!first.flagged);
}

#[tokio::test]
async fn templates_start_unflagged_unless_requested() {
    let (hooks, _) = setup().await;
    let owner = Uuid::new_v4();

    let plain = hooks.templates.create(named(owner, "plain"), false).await.unwrap();
    assert!(!plain.flagged);

    let default = hooks.templates.create(named(owner, "default"), true).await.unwrap();
    assert!(default.flagged);

    let another = hooks.templates.create(named(owner, "another"), false).await.unwrap();
    assert!(!another.flagged);
}

#[tokio::test]
async fn update_hook_elects_and_demotes() {
    let (hooks, store) = setup().await;
    let owner = Uuid::new_v4();

    let a = hooks.templates.create(named(owner, "a"), true).await.unwrap();
    let b = hooks.templates.create(named(owner, "b"), false).await.unwrap();

    hooks.templates.after_update(owner, b.id, Some(true)).await.unwrap();
    assert!(!store.get(ResourceFamily::Template, owner, a.id).await.unwrap().flagged);
    assert!(store.get(ResourceFamily::Template, owner, b.id).await.unwrap().flagged);

    hooks.templates.after_update(owner, b.id, Some(false)).await.unwrap();
    assert!(!store.get(ResourceFamily::Template, owner, b.id).await.unwrap().flagged);

    hooks.templates.after_update(owner, a.id, None).await.unwrap();
    assert!(!store.get(ResourceFamily::Template, owner, a.id).await.unwrap().flagged);
}

#[tokio::test]
async fn update_hook_rejects_foreign_resource() {
    let (hooks, _) = setup().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let theirs = hooks.resumes.create(named(bob, "cv"), false).await.unwrap();

    for requested in [Some(true), Some(false), None] {
        let err = hooks
            .resumes
            .after_update(alice, theirs.id, requested)
            .await
            .unwrap_err();
        assert!(matches!(err, HirelogError::NotFound { .. }), "{requested:?}");
    }
}

#[tokio::test]
async fn delete_hooks_follow_family_policy() {
    let (hooks, store) = setup().await;
    let owner = Uuid::new_v4();

    let r1 = hooks.resumes.create(named(owner, "r1"), false).await.unwrap();
    let r2 = hooks.resumes.create(named(owner, "r2"), false).await.unwrap();
    assert_eq!(hooks.resumes.delete(owner, r2.id).await.unwrap(), Some(r1.id));

    let t1 = hooks.templates.create(named(owner, "t1"), true).await.unwrap();
    let t2 = hooks.templates.create(named(owner, "t2"), false).await.unwrap();
    let heir = hooks
        .templates
        .delete_many(owner, vec![t2.id])
        .await
        .unwrap();
    assert_eq!(heir, None);
    assert!(store.get(ResourceFamily::Template, owner, t1.id).await.unwrap().flagged);
}

#[tokio::test]
async fn for_family_routes_to_matching_hooks() {
    let (hooks, _) = setup().await;
    assert_eq!(hooks.for_family(ResourceFamily::Resume).family(), ResourceFamily::Resume);
    assert_eq!(
        hooks.for_family(ResourceFamily::Template).family(),
        ResourceFamily::Template
    );

    let owner = Uuid::new_v4();
    let r = hooks
        .for_family(ResourceFamily::Resume)
        .create(named(owner, "cv"), false)
        .await
        .unwrap();
    hooks
        .for_family(ResourceFamily::Resume)
        .elect(owner, r.id)
        .await
        .unwrap();
    assert!(r.flagged);
}
