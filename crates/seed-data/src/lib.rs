//! Sample data seeding for the admin platform.
//!
//! Every feature module (posts, comments, roles, orders, ...) can be filled
//! with generated records on demand. Seeding is dependency aware: comments
//! need posts, posts need users, users need roles, and the manager seeds
//! whatever is missing first. Each module also gets its default
//! feature/field/setting rows once, and its stats counters are recomputed
//! after every bulk seed or clear.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use seed_data::prelude::*;
//!
//! let store = Arc::new(MemoryStore::new());
//! let registry = Arc::new(Registry::builtin()?);
//! let manager = SeedManager::new(store, registry, ManagerOptions::default());
//!
//! let result = manager.seed_module(ModuleKey::Comments, 50, false).await?;
//! println!("{} comments, {} records overall", result.created, result.total_created());
//!
//! let report = manager.seed_preset(Preset::Demo, false).await;
//! println!("{report}");
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod faker;
pub mod generators;
pub mod manager;
pub mod module_config;
pub mod registry;
pub mod resolver;
pub mod stats;

pub use platform::{MemoryStore, ModuleKey, PgStore, Store};

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use std::sync::Arc;

    pub use crate::config::{Preset, SeedConfig, SeedSettings};
    pub use crate::db::{ModuleSeeder, RecordGenerator, SeedContext, SeedResult, Seeder};
    pub use crate::error::{ConfigError, RegistryError, SeedError};
    pub use crate::faker::{FakeValues, Locale, LocaleFaker, WeightTable};
    pub use crate::manager::{ManagerOptions, PresetReport, SeedManager};
    pub use crate::module_config::{ModuleConfigDefaults, ModuleConfigSeeder};
    pub use crate::registry::{Dependency, ModuleDescriptor, Registry};
    pub use crate::stats::StatsMaintainer;
    pub use crate::{MemoryStore, ModuleKey, PgStore, Store};
}
