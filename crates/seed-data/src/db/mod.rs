//! Seeding against the platform store.
//!
//! A [`Seeder`] owns one module's records. [`ModuleSeeder`] implements the
//! common flow (config, skip-or-clear, batched generation, stats) on top of a
//! module-specific [`RecordGenerator`].

mod seeder;

pub use seeder::{ModuleSeeder, RecordGenerator, SeedContext, SeedResult, Seeder};
