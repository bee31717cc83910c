//! End-to-end seeding behaviour against the in-memory store.
//!
//! Run with: `cargo test -p seed-data --test seeding_properties`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use platform::models::{Comment, Post};
use platform::{Collection, Document, MemoryStore, ModuleKey, Query, Store, StoreError, StoreExt};
use seed_data::config::{Preset, PresetQuantities, SeedConfig};
use seed_data::db::{SeedContext, SeedResult, Seeder};
use seed_data::error::{RegistryError, SeedError};
use seed_data::manager::{ManagerOptions, SeedManager};
use seed_data::registry::{Dependency, ModuleDescriptor, Registry};
use seed_data::stats::TOTAL_KEY;
use serde_json::Value;
use uuid::Uuid;

/// A seeder that always fails, standing in for a broken module.
struct FailingSeeder(ModuleKey);

#[async_trait]
impl Seeder for FailingSeeder {
    fn module(&self) -> ModuleKey {
        self.0
    }

    async fn seed(&self, _ctx: &SeedContext, _config: &SeedConfig) -> Result<SeedResult, SeedError> {
        Err(SeedError::Failed {
            module: self.0,
            message: "simulated failure".to_string(),
        })
    }

    async fn clear(&self, _ctx: &SeedContext) -> Result<usize, SeedError> {
        Ok(0)
    }
}

/// Memory store whose inserts and deletes in one collection start failing
/// once a write budget is used up, like a connection dropping mid-seed.
struct FlakyStore {
    inner: MemoryStore,
    collection: Collection,
    writes_left: AtomicUsize,
}

impl FlakyStore {
    fn new(collection: Collection) -> Self {
        Self {
            inner: MemoryStore::new(),
            collection,
            writes_left: AtomicUsize::new(usize::MAX),
        }
    }

    fn fail_after(&self, writes: usize) {
        self.writes_left.store(writes, Ordering::SeqCst);
    }

    fn recover(&self) {
        self.fail_after(usize::MAX);
    }

    fn take_write(&self, collection: Collection) -> Result<(), StoreError> {
        if collection != self.collection {
            return Ok(());
        }
        self.writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .map(|_| ())
            .map_err(|_| StoreError::InvalidDocument {
                collection,
                reason: "connection lost".to_string(),
            })
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn insert(&self, collection: Collection, data: Value) -> Result<Uuid, StoreError> {
        self.take_write(collection)?;
        self.inner.insert(collection, data).await
    }

    async fn patch(
        &self,
        collection: Collection,
        id: Uuid,
        partial: Value,
    ) -> Result<(), StoreError> {
        self.inner.patch(collection, id, partial).await
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError> {
        self.take_write(collection)?;
        self.inner.delete(collection, id).await
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn collect(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.inner.collect(query).await
    }
}

/// Memory store remembering how many users existed when the first post
/// was written.
#[derive(Default)]
struct PostWatchStore {
    inner: MemoryStore,
    users_at_first_post: Mutex<Option<usize>>,
}

#[async_trait]
impl Store for PostWatchStore {
    async fn insert(&self, collection: Collection, data: Value) -> Result<Uuid, StoreError> {
        if collection == Collection::Posts {
            let users = self.inner.count(&Query::new(Collection::Users)).await?;
            self.users_at_first_post.lock().unwrap().get_or_insert(users);
        }
        self.inner.insert(collection, data).await
    }

    async fn patch(
        &self,
        collection: Collection,
        id: Uuid,
        partial: Value,
    ) -> Result<(), StoreError> {
        self.inner.patch(collection, id, partial).await
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn collect(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.inner.collect(query).await
    }
}

fn options() -> ManagerOptions {
    ManagerOptions {
        rng_seed: Some(2024),
        ..ManagerOptions::default()
    }
}

fn setup(registry: Registry) -> (Arc<MemoryStore>, SeedManager) {
    let store = Arc::new(MemoryStore::new());
    let manager = SeedManager::new(store.clone(), Arc::new(registry), options());
    (store, manager)
}

fn builtin() -> (Arc<MemoryStore>, SeedManager) {
    setup(Registry::builtin().unwrap())
}

async fn count(store: &MemoryStore, collection: Collection) -> usize {
    store.count(&Query::new(collection)).await.unwrap()
}

async fn config_rows(store: &MemoryStore, module: ModuleKey) -> usize {
    let mut total = 0;
    for collection in [
        Collection::ModuleFeatures,
        Collection::ModuleFields,
        Collection::ModuleSettings,
    ] {
        total += store
            .count(&Query::new(collection).eq("moduleKey", module.as_str()))
            .await
            .unwrap();
    }
    total
}

#[tokio::test]
async fn test_seeding_satisfied_module_is_a_no_op() {
    let (store, manager) = builtin();
    manager.seed_module(ModuleKey::Categories, 8, false).await.unwrap();
    let before = count(&store, Collection::Categories).await;

    let result = manager.seed_module(ModuleKey::Categories, 8, false).await.unwrap();

    assert_eq!(result.created, 0);
    assert_eq!(result.skipped, before);
    assert_eq!(count(&store, Collection::Categories).await, before);
}

#[tokio::test]
async fn test_dependent_records_reference_existing_dependencies() {
    let (store, manager) = builtin();

    let result = manager.seed_module(ModuleKey::Comments, 30, true).await.unwrap();
    assert!(result.is_success());
    assert!(count(&store, Collection::Posts).await >= 1);

    let posts: Vec<_> = store.all_records::<Post>().await.unwrap();
    let post_ids: Vec<_> = posts.iter().map(|(id, _)| *id).collect();
    for (_, comment) in store.all_records::<Comment>().await.unwrap() {
        assert!(post_ids.contains(&comment.post_id));
    }

    // Cross-module counter refreshed by the comments seeder.
    let referenced: u32 = posts.iter().map(|(_, post)| post.comment_count).sum();
    assert_eq!(referenced as usize, count(&store, Collection::Comments).await);
}

#[tokio::test]
async fn test_failing_required_dependency_fails_target() {
    let (store, manager) = builtin();
    let manager = manager.with_seeder(Arc::new(FailingSeeder(ModuleKey::Users)));

    let err = manager.seed_module(ModuleKey::Posts, 10, true).await.unwrap_err();

    assert!(err.to_string().contains("'users'"), "{err}");
    match err {
        SeedError::UnsatisfiedDependency {
            module, dependency, ..
        } => {
            assert_eq!(module, ModuleKey::Posts);
            assert_eq!(dependency, ModuleKey::Users);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(count(&store, Collection::Posts).await, 0);
}

#[tokio::test]
async fn test_failing_optional_dependency_does_not_block() {
    let (store, manager) = builtin();
    let manager = manager.with_seeder(Arc::new(FailingSeeder(ModuleKey::Categories)));

    let result = manager.seed_module(ModuleKey::Posts, 10, true).await.unwrap();

    assert_eq!(result.created, 10);
    let categories = result
        .dependency_results
        .iter()
        .find(|r| r.module == ModuleKey::Categories)
        .unwrap();
    assert!(!categories.is_success());

    for (_, post) in store.all_records::<Post>().await.unwrap() {
        assert!(post.category_id.is_none());
    }
}

#[tokio::test]
async fn test_force_does_not_cascade_to_dependencies() {
    let (store, manager) = builtin();
    manager.seed_module(ModuleKey::Posts, 5, false).await.unwrap();
    let users = count(&store, Collection::Users).await;

    let result = manager.seed_module(ModuleKey::Posts, 7, true).await.unwrap();

    assert_eq!(result.created, 7);
    assert_eq!(count(&store, Collection::Posts).await, 7);
    assert_eq!(count(&store, Collection::Users).await, users);
    assert!(result.dependency_results.iter().all(|r| r.created == 0));
}

#[tokio::test]
async fn test_dependency_topped_up_to_min_records_before_dependents() {
    let registry = Registry::new(vec![
        ModuleDescriptor::new(ModuleKey::Roles, "Roles").quantities(2, 10),
        ModuleDescriptor::new(ModuleKey::Users, "Users")
            .depends_on(Dependency::required(ModuleKey::Roles, 1))
            .quantities(3, 50)
            .stats(&["status"]),
        ModuleDescriptor::new(ModuleKey::Posts, "Posts")
            .depends_on(Dependency::required(ModuleKey::Users, 5))
            .quantities(4, 50)
            .stats(&["status"]),
    ])
    .unwrap();
    let store = Arc::new(PostWatchStore::default());
    let manager = SeedManager::new(store.clone(), Arc::new(registry), options());
    manager.seed_module(ModuleKey::Users, 2, false).await.unwrap();

    let result = manager.seed_module(ModuleKey::Posts, 4, false).await.unwrap();

    assert_eq!(result.created, 4);
    let users = &result.dependency_results[0];
    assert_eq!(users.module, ModuleKey::Users);
    assert_eq!(users.created, 3);
    assert_eq!(*store.users_at_first_post.lock().unwrap(), Some(5));
    assert_eq!(
        manager
            .context()
            .stats()
            .counter(ModuleKey::Users, TOTAL_KEY)
            .await
            .unwrap(),
        5
    );
}

#[tokio::test]
async fn test_interrupted_seed_leaves_counters_matching_records() {
    let store = Arc::new(FlakyStore::new(Collection::Customers));
    let manager = SeedManager::new(
        store.clone(),
        Arc::new(Registry::builtin().unwrap()),
        options(),
    );
    let stats = manager.context().stats();

    store.fail_after(5);
    let err = manager
        .seed_module(ModuleKey::Customers, 10, false)
        .await
        .unwrap_err();
    assert!(matches!(err, SeedError::Store(_)), "{err}");
    assert_eq!(count(&store.inner, Collection::Customers).await, 5);
    assert_eq!(stats.counter(ModuleKey::Customers, TOTAL_KEY).await.unwrap(), 5);

    store.recover();
    let result = manager
        .seed_module(ModuleKey::Customers, 10, false)
        .await
        .unwrap();
    assert_eq!(result.created, 0);
    assert_eq!(result.skipped, 5);
    assert_eq!(stats.counter(ModuleKey::Customers, TOTAL_KEY).await.unwrap(), 5);
}

#[tokio::test]
async fn test_interrupted_clear_leaves_counters_matching_records() {
    let store = Arc::new(FlakyStore::new(Collection::Customers));
    let manager = SeedManager::new(
        store.clone(),
        Arc::new(Registry::builtin().unwrap()),
        options(),
    );
    manager.seed_module(ModuleKey::Customers, 10, false).await.unwrap();

    store.fail_after(4);
    assert!(manager.clear_module(ModuleKey::Customers).await.is_err());

    assert_eq!(count(&store.inner, Collection::Customers).await, 6);
    assert_eq!(
        manager
            .context()
            .stats()
            .counter(ModuleKey::Customers, TOTAL_KEY)
            .await
            .unwrap(),
        6
    );
}

#[tokio::test]
async fn test_cyclic_registry_is_rejected() {
    let err = Registry::new(vec![
        ModuleDescriptor::new(ModuleKey::Menus, "Menus")
            .depends_on(Dependency::required(ModuleKey::HomepageSections, 1)),
        ModuleDescriptor::new(ModuleKey::HomepageSections, "Homepage Sections")
            .depends_on(Dependency::required(ModuleKey::Menus, 1)),
    ])
    .unwrap_err();

    assert!(matches!(err, RegistryError::Cycle { .. }));
    assert!(err.to_string().contains("menus -> homepageSections -> menus")
        || err.to_string().contains("homepageSections -> menus -> homepageSections"));
}

#[tokio::test]
async fn test_comment_stats_match_persisted_records() {
    let (store, manager) = builtin();

    let result = manager.seed_module(ModuleKey::Comments, 50, true).await.unwrap();

    let persisted = count(&store, Collection::Comments).await;
    assert_eq!(result.created, persisted);

    let stats = manager.context().stats();
    assert_eq!(
        stats.partition_total(ModuleKey::Comments, "status").await.unwrap(),
        persisted as u64
    );
    assert_eq!(
        stats.counter(ModuleKey::Comments, TOTAL_KEY).await.unwrap(),
        persisted as u64
    );
}

#[tokio::test]
async fn test_clear_removes_records_and_stats_but_keeps_config() {
    let (store, manager) = builtin();
    manager.seed_module(ModuleKey::Notifications, 20, false).await.unwrap();
    assert!(config_rows(&store, ModuleKey::Notifications).await > 0);

    manager.clear_module_named("notifications").await.unwrap();

    assert_eq!(count(&store, Collection::Notifications).await, 0);
    assert!(
        manager
            .context()
            .stats()
            .counters(ModuleKey::Notifications)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(config_rows(&store, ModuleKey::Notifications).await > 0);
    // Dependencies are untouched.
    assert!(count(&store, Collection::Users).await > 0);
}

#[tokio::test]
async fn test_clear_module_config_is_explicit() {
    let (store, manager) = builtin();
    manager.seed_module(ModuleKey::Comments, 5, false).await.unwrap();

    manager.clear_module_config(ModuleKey::Comments).await.unwrap();

    assert_eq!(config_rows(&store, ModuleKey::Comments).await, 0);
    assert_eq!(count(&store, Collection::Comments).await, 5);
}

#[tokio::test]
async fn test_preset_isolates_module_failures() {
    let registry = Registry::new(vec![
        ModuleDescriptor::new(ModuleKey::Roles, "Roles")
            .quantities(3, 10)
            .presets(PresetQuantities::new(3, 3, 3, 3)),
        ModuleDescriptor::new(ModuleKey::Categories, "Categories")
            .quantities(4, 10)
            .presets(PresetQuantities::new(4, 4, 4, 4)),
        ModuleDescriptor::new(ModuleKey::Customers, "Customers")
            .quantities(5, 10)
            .presets(PresetQuantities::new(5, 5, 5, 5)),
        ModuleDescriptor::new(ModuleKey::Menus, "Menus")
            .quantities(2, 10)
            .presets(PresetQuantities::new(2, 2, 2, 2)),
    ])
    .unwrap();
    let (_store, manager) = setup(registry);
    let manager = manager.with_seeder(Arc::new(FailingSeeder(ModuleKey::Customers)));

    let report = manager.seed_preset(Preset::Minimal, false).await;

    assert_eq!(report.total_modules(), 4);
    assert_eq!(report.success_modules(), 3);

    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].module, ModuleKey::Customers);
    assert!(!failed[0].errors.is_empty());

    for result in report.results.iter().filter(|r| r.is_success()) {
        assert!(result.created + result.invalid > 0);
    }
    assert!(report.to_string().starts_with("3/4 modules succeeded"));
}

#[tokio::test]
async fn test_full_preset_seeds_every_module() {
    let (store, manager) = builtin();

    let report = manager.seed_preset(Preset::Minimal, false).await;

    assert_eq!(report.total_modules(), ModuleKey::ALL.len());
    assert_eq!(report.success_modules(), ModuleKey::ALL.len(), "{report}");
    for module in ModuleKey::ALL {
        assert!(count(&store, module.collection()).await > 0, "{module} is empty");
    }
}

#[tokio::test]
async fn test_role_config_seeded_once() {
    let (store, manager) = builtin();

    manager.seed_module(ModuleKey::Roles, 4, false).await.unwrap();
    let rows = config_rows(&store, ModuleKey::Roles).await;
    manager.seed_module(ModuleKey::Roles, 4, true).await.unwrap();
    manager.seed_module_named("roles", 4, false).await.unwrap();

    assert!(rows > 0);
    assert_eq!(config_rows(&store, ModuleKey::Roles).await, rows);
}

#[tokio::test]
async fn test_concurrent_force_reseeds_do_not_interleave() {
    let (store, manager) = builtin();
    let manager = Arc::new(manager);

    let a = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.seed_module(ModuleKey::Customers, 6, true).await })
    };
    let b = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.seed_module(ModuleKey::Customers, 6, true).await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(count(&store, Collection::Customers).await, 6);
    assert_eq!(
        manager
            .context()
            .stats()
            .counter(ModuleKey::Customers, TOTAL_KEY)
            .await
            .unwrap(),
        6
    );
}
