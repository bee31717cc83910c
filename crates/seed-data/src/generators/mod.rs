//! Record generators of the built-in modules.
//!
//! One generator per module:
//! - [`RoleGenerator`], [`UserGenerator`]: access control
//! - [`CategoryGenerator`], [`PostGenerator`], [`CommentGenerator`],
//!   [`MenuGenerator`], [`HomepageSectionGenerator`]: content
//! - [`NotificationGenerator`]: per-user notifications
//! - [`ProductGenerator`], [`CustomerGenerator`], [`OrderGenerator`]: commerce
//!
//! Generators reference existing records only through ids loaded into their
//! pool, so every foreign key they emit points at a stored record.

pub mod category;
pub mod comment;
pub mod customer;
pub mod homepage;
pub mod menu;
pub mod notification;
pub mod order;
pub mod post;
pub mod product;
pub mod role;
pub mod user;

use std::collections::HashMap;
use std::sync::Arc;

use platform::{Collection, ModuleKey, Query, Store};
use serde_json::{Map, Value, json};
use tracing::debug;
use uuid::Uuid;

use crate::db::{ModuleSeeder, Seeder};
use crate::error::SeedError;
use crate::faker::{FakeValues, pick};

pub use category::CategoryGenerator;
pub use comment::CommentGenerator;
pub use customer::CustomerGenerator;
pub use homepage::HomepageSectionGenerator;
pub use menu::MenuGenerator;
pub use notification::NotificationGenerator;
pub use order::OrderGenerator;
pub use post::PostGenerator;
pub use product::ProductGenerator;
pub use role::RoleGenerator;
pub use user::UserGenerator;

/// The built-in seeder of `module`.
pub fn builtin_seeder(module: ModuleKey) -> Arc<dyn Seeder> {
    match module {
        ModuleKey::Roles => Arc::new(ModuleSeeder::new(RoleGenerator)),
        ModuleKey::Users => Arc::new(ModuleSeeder::new(UserGenerator)),
        ModuleKey::Categories => Arc::new(ModuleSeeder::new(CategoryGenerator)),
        ModuleKey::Posts => Arc::new(ModuleSeeder::new(PostGenerator)),
        ModuleKey::Comments => Arc::new(ModuleSeeder::new(CommentGenerator)),
        ModuleKey::Menus => Arc::new(ModuleSeeder::new(MenuGenerator)),
        ModuleKey::Notifications => Arc::new(ModuleSeeder::new(NotificationGenerator)),
        ModuleKey::Products => Arc::new(ModuleSeeder::new(ProductGenerator)),
        ModuleKey::Customers => Arc::new(ModuleSeeder::new(CustomerGenerator)),
        ModuleKey::Orders => Arc::new(ModuleSeeder::new(OrderGenerator)),
        ModuleKey::HomepageSections => Arc::new(ModuleSeeder::new(HomepageSectionGenerator)),
    }
}

/// Ids of every document in `collection`.
pub(crate) async fn load_ids(store: &dyn Store, collection: Collection) -> Result<Vec<Uuid>, SeedError> {
    Ok(store
        .collect(&Query::new(collection))
        .await?
        .into_iter()
        .map(|doc| doc.id)
        .collect())
}

/// A random id from a required pool.
pub(crate) fn required_id(
    faker: &mut dyn FakeValues,
    ids: &[Uuid],
    module: ModuleKey,
    pool: ModuleKey,
) -> Result<Uuid, SeedError> {
    pick(faker, ids)
        .copied()
        .ok_or(SeedError::EmptyPool { module, pool })
}

/// Rewrites `counter_field` on every `target` document with the number of
/// `source` documents whose `source_field` references it.
pub(crate) async fn refresh_reference_counts(
    store: &dyn Store,
    target: Collection,
    source: Collection,
    source_field: &str,
    counter_field: &str,
) -> Result<(), SeedError> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for doc in store.collect(&Query::new(source)).await? {
        if let Some(Value::String(id)) = doc.field(source_field) {
            *counts.entry(id.clone()).or_default() += 1;
        }
    }

    let mut patched = 0;
    for doc in store.collect(&Query::new(target)).await? {
        let count = counts.get(&doc.id.to_string()).copied().unwrap_or(0);
        if doc.field(counter_field) != Some(&json!(count)) {
            store
                .patch(target, doc.id, single_field(counter_field, json!(count)))
                .await?;
            patched += 1;
        }
    }

    debug!("Refreshed {target}.{counter_field} on {patched} record(s)");
    Ok(())
}

pub(crate) fn single_field(field: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(field.to_string(), value);
    Value::Object(map)
}
