//! Shared domain records and the persistence boundary of the admin platform.
//!
//! Feature modules (content, commerce, users) store their records as JSON
//! documents in named collections. [`database::Store`] is the only way the
//! rest of the platform touches storage; [`memory_store::MemoryStore`] and
//! [`pg_store::PgStore`] implement it.

pub mod database;
pub mod errors;
pub mod memory_store;
pub mod models;
pub mod pg_store;

pub use database::{Document, Query, Store, StoreExt};
pub use errors::StoreError;
pub use memory_store::MemoryStore;
pub use models::{Collection, ModuleKey, Record};
pub use pg_store::PgStore;
