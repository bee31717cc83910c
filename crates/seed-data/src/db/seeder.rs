//! Module seeders and the shared seeding flow.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use enum_map::Enum;
use platform::{ModuleKey, Query, Record, Store, StoreExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::SeedConfig;
use crate::error::SeedError;
use crate::faker::{FakeValues, Locale, LocaleFaker};
use crate::module_config::{ModuleConfigDefaults, ModuleConfigSeeder};
use crate::registry::Registry;
use crate::stats::StatsMaintainer;

/// Outcome of seeding one module, with the dependencies seeded on its behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedResult {
    pub module: ModuleKey,
    pub created: usize,
    /// Records already present when seeding was skipped.
    pub skipped: usize,
    /// Generated records rejected by the validator.
    pub invalid: usize,
    pub duration_ms: u64,
    pub dependency_results: Vec<SeedResult>,
    pub errors: Vec<String>,
}

impl SeedResult {
    pub fn new(module: ModuleKey) -> Self {
        Self {
            module,
            created: 0,
            skipped: 0,
            invalid: 0,
            duration_ms: 0,
            dependency_results: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn skipped(module: ModuleKey, existing: usize) -> Self {
        Self {
            skipped: existing,
            ..Self::new(module)
        }
    }

    pub fn failed(module: ModuleKey, error: impl ToString) -> Self {
        Self {
            errors: vec![error.to_string()],
            ..Self::new(module)
        }
    }

    /// Whether this module itself seeded (or skipped) without error.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records created for this module and every dependency below it.
    pub fn total_created(&self) -> usize {
        self.created
            + self
                .dependency_results
                .iter()
                .map(SeedResult::total_created)
                .sum::<usize>()
    }

    fn finish(mut self, started: Instant) -> Self {
        self.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// Shared services handed to every seeder.
#[derive(Clone)]
pub struct SeedContext {
    store: Arc<dyn Store>,
    stats: StatsMaintainer,
    module_config: ModuleConfigSeeder,
    locale: Locale,
    rng_seed: Option<u64>,
}

impl SeedContext {
    pub fn new(store: Arc<dyn Store>, registry: Arc<Registry>) -> Self {
        Self {
            stats: StatsMaintainer::new(store.clone(), registry),
            module_config: ModuleConfigSeeder::new(store.clone()),
            store,
            locale: Locale::default(),
            rng_seed: None,
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Makes generated data reproducible.
    pub fn with_rng_seed(mut self, seed: Option<u64>) -> Self {
        self.rng_seed = seed;
        self
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn stats(&self) -> &StatsMaintainer {
        &self.stats
    }

    pub fn module_config(&self) -> &ModuleConfigSeeder {
        &self.module_config
    }

    /// A faker for one module. With an RNG seed, each module gets its own
    /// deterministic stream, and so does each `existing` record count, so a
    /// top-up does not replay the records generated before it.
    pub fn faker_for(&self, module: ModuleKey, existing: usize) -> Box<dyn FakeValues> {
        match self.rng_seed {
            Some(seed) => {
                let offset = (module.into_usize() as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
                let salt = (existing as u64).wrapping_mul(0xD1B5_4A32_D192_ED03);
                Box::new(LocaleFaker::seeded(self.locale, seed ^ offset ^ salt))
            }
            None => Box::new(LocaleFaker::new(self.locale)),
        }
    }
}

/// Seeds and clears the records of one module.
#[async_trait]
pub trait Seeder: Send + Sync {
    fn module(&self) -> ModuleKey;

    /// Number of primary records currently stored.
    async fn count(&self, ctx: &SeedContext) -> Result<usize, SeedError> {
        Ok(ctx
            .store()
            .count(&Query::new(self.module().collection()))
            .await?)
    }

    async fn seed(&self, ctx: &SeedContext, config: &SeedConfig) -> Result<SeedResult, SeedError>;

    /// Removes every primary record and the module's stats. Config rows stay.
    async fn clear(&self, ctx: &SeedContext) -> Result<usize, SeedError>;

    /// Removes the module's feature/field/setting rows.
    async fn clear_config(&self, ctx: &SeedContext) -> Result<usize, SeedError> {
        ctx.module_config().clear(self.module()).await
    }
}

/// Module-specific half of a seeder: what records look like and which
/// existing records they may reference.
#[async_trait]
pub trait RecordGenerator: Send + Sync {
    type Record: Record;

    /// Ids (and whatever else) of existing records that generated records
    /// reference. Loaded once per seed.
    type Pool: Send + Sync;

    const MODULE: ModuleKey;

    async fn load_pool(&self, store: &dyn Store) -> Result<Self::Pool, SeedError>;

    /// Generates one candidate record.
    ///
    /// Fails with [`SeedError::EmptyPool`] when a required reference has no
    /// candidates; optional references are left empty instead.
    fn generate_fake(
        &self,
        pool: &Self::Pool,
        faker: &mut dyn FakeValues,
    ) -> Result<Self::Record, SeedError>;

    /// Whether a candidate may be persisted.
    fn validate_record(&self, record: &Self::Record) -> bool;

    fn config_defaults(&self) -> ModuleConfigDefaults;

    /// Runs after every bulk seed and clear, with the number of records
    /// created (0 after a clear). Used to refresh counters other modules
    /// keep about this one.
    async fn after_seed(&self, _store: &dyn Store, _created: usize) -> Result<(), SeedError> {
        Ok(())
    }
}

/// [`Seeder`] driving a [`RecordGenerator`].
pub struct ModuleSeeder<G> {
    generator: G,
}

impl<G: RecordGenerator> ModuleSeeder<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Generates `count` candidates and keeps the valid ones. Returns them
    /// with the number rejected.
    pub fn generate_batch(
        &self,
        pool: &G::Pool,
        count: usize,
        faker: &mut dyn FakeValues,
    ) -> Result<(Vec<G::Record>, usize), SeedError> {
        let mut records = Vec::with_capacity(count);
        let mut invalid = 0;

        for _ in 0..count {
            let record = self.generator.generate_fake(pool, faker)?;
            if self.generator.validate_record(&record) {
                records.push(record);
            } else {
                invalid += 1;
            }
        }

        Ok((records, invalid))
    }

    /// Generates and persists `config.quantity` candidates in batches,
    /// counting into `result` as records land.
    async fn insert_batches(
        &self,
        ctx: &SeedContext,
        config: &SeedConfig,
        existing: usize,
        result: &mut SeedResult,
    ) -> Result<(), SeedError> {
        let module = G::MODULE;
        let pool = self.generator.load_pool(ctx.store()).await?;
        let mut faker = ctx.faker_for(module, existing);
        let mut remaining = config.quantity;

        while remaining > 0 {
            let size = remaining.min(config.batch_size.max(1));
            let (records, invalid) = self.generate_batch(&pool, size, faker.as_mut())?;
            result.invalid += invalid;

            for record in &records {
                ctx.store().insert_record(record).await?;
                result.created += 1;
            }
            remaining -= size;

            info!(
                "  Seeded {}/{} {module}",
                config.quantity - remaining,
                config.quantity
            );
        }
        Ok(())
    }

    /// Recomputes stats and runs `after_seed`, then hands back `outcome`.
    /// Also runs when the bulk operation failed halfway.
    async fn refresh_after<T: Send>(
        &self,
        ctx: &SeedContext,
        created: usize,
        outcome: Result<T, SeedError>,
    ) -> Result<T, SeedError> {
        let module = G::MODULE;
        let refreshed = match ctx.stats().recompute(module).await {
            Ok(_) => self.generator.after_seed(ctx.store(), created).await,
            Err(err) => Err(err),
        };

        match (outcome, refreshed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(refresh_err)) => {
                warn!("Could not refresh {module} counters: {refresh_err}");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl<G: RecordGenerator> Seeder for ModuleSeeder<G> {
    fn module(&self) -> ModuleKey {
        G::MODULE
    }

    async fn seed(&self, ctx: &SeedContext, config: &SeedConfig) -> Result<SeedResult, SeedError> {
        let module = G::MODULE;
        let started = Instant::now();

        ctx.module_config()
            .ensure(&self.generator.config_defaults())
            .await?;

        let existing = if config.force {
            self.clear(ctx).await?;
            0
        } else {
            let existing = self.count(ctx).await?;
            if existing >= config.skip_threshold {
                info!("{module} already has {existing} record(s), skipping");
                return Ok(SeedResult::skipped(module, existing).finish(started));
            }
            existing
        };

        info!("Seeding {} {module}...", config.quantity);

        let mut result = SeedResult::new(module);
        let inserted = self.insert_batches(ctx, config, existing, &mut result).await;
        if let Err(err) = &inserted {
            warn!(
                "Seeding {module} stopped after {} record(s): {err}",
                result.created
            );
        }
        self.refresh_after(ctx, result.created, inserted).await?;

        if result.created == 0 && result.invalid > 0 {
            warn!(
                "Validator rejected all {} generated {module} record(s)",
                result.invalid
            );
        }

        info!(
            "Seeded {} {module} ({} rejected)",
            result.created, result.invalid
        );
        Ok(result.finish(started))
    }

    async fn clear(&self, ctx: &SeedContext) -> Result<usize, SeedError> {
        let module = G::MODULE;

        let deleted = ctx
            .store()
            .delete_where(&Query::new(module.collection()))
            .await
            .map_err(SeedError::from);
        let deleted = self.refresh_after(ctx, 0, deleted).await?;

        info!("Cleared {deleted} {module}");
        Ok(deleted)
    }
}
