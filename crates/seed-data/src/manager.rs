//! Seeding orchestration.
//!
//! [`SeedManager`] resolves dependency order, seeds unsatisfied dependencies
//! one after another, then seeds the target. Everything runs sequentially:
//! a dependent never starts before its dependencies are persisted.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use enum_map::EnumMap;
use platform::{ModuleKey, Store};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::{DEFAULT_BATCH_SIZE, Preset, SeedConfig};
use crate::db::{SeedContext, SeedResult, Seeder};
use crate::error::SeedError;
use crate::faker::Locale;
use crate::generators::builtin_seeder;
use crate::registry::Registry;
use crate::resolver::DependencyResolver;

/// Process-wide seeding options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerOptions {
    pub batch_size: usize,
    pub locale: Locale,
    /// Fixed RNG seed for reproducible data.
    pub rng_seed: Option<u64>,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            locale: Locale::default(),
            rng_seed: None,
        }
    }
}

/// Results of one preset run, one entry per module.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetReport {
    pub preset: Preset,
    pub results: Vec<SeedResult>,
    pub duration_ms: u64,
}

impl PresetReport {
    pub fn success_modules(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn total_modules(&self) -> usize {
        self.results.len()
    }

    pub fn total_created(&self) -> usize {
        self.results.iter().map(SeedResult::total_created).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &SeedResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}

impl fmt::Display for PresetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} modules succeeded, {} records created",
            self.success_modules(),
            self.total_modules(),
            self.total_created()
        )
    }
}

/// Dashboard summary of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleOverview {
    pub module: ModuleKey,
    pub display_name: String,
    pub records: usize,
    pub has_config: bool,
}

pub struct SeedManager {
    registry: Arc<Registry>,
    ctx: SeedContext,
    seeders: EnumMap<ModuleKey, Option<Arc<dyn Seeder>>>,
    locks: EnumMap<ModuleKey, Mutex<()>>,
    batch_size: usize,
}

impl SeedManager {
    /// Creates a manager with the built-in seeder of every registered module.
    pub fn new(store: Arc<dyn Store>, registry: Arc<Registry>, options: ManagerOptions) -> Self {
        let ctx = SeedContext::new(store, registry.clone())
            .with_locale(options.locale)
            .with_rng_seed(options.rng_seed);

        let mut seeders: EnumMap<ModuleKey, Option<Arc<dyn Seeder>>> = EnumMap::default();
        for module in registry.seeding_order() {
            seeders[*module] = Some(builtin_seeder(*module));
        }

        Self {
            registry,
            ctx,
            seeders,
            locks: EnumMap::default(),
            batch_size: options.batch_size.max(1),
        }
    }

    /// Replaces the seeder of `seeder.module()`.
    pub fn with_seeder(mut self, seeder: Arc<dyn Seeder>) -> Self {
        let module = seeder.module();
        self.seeders[module] = Some(seeder);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn context(&self) -> &SeedContext {
        &self.ctx
    }

    fn seeder(&self, module: ModuleKey) -> Result<&Arc<dyn Seeder>, SeedError> {
        if !self.registry.contains(module) {
            return Err(SeedError::NoSeeder(module));
        }
        self.seeders[module]
            .as_ref()
            .ok_or(SeedError::NoSeeder(module))
    }

    fn parse(name: &str) -> Result<ModuleKey, SeedError> {
        ModuleKey::parse(name).ok_or_else(|| SeedError::UnknownModule(name.to_string()))
    }

    /// Seeds `module` and, first, whatever it depends on.
    pub async fn seed_module(
        &self,
        module: ModuleKey,
        quantity: usize,
        force: bool,
    ) -> Result<SeedResult, SeedError> {
        let config = SeedConfig::new(quantity)
            .with_force(force)
            .with_batch_size(self.batch_size);
        self.seed_module_with(module, config).await
    }

    pub async fn seed_module_named(
        &self,
        name: &str,
        quantity: usize,
        force: bool,
    ) -> Result<SeedResult, SeedError> {
        self.seed_module(Self::parse(name)?, quantity, force).await
    }

    /// Seeds `module` with explicit options.
    ///
    /// Dependencies are seeded without `force` and only when they hold fewer
    /// records than required. A required dependency that stays unsatisfied
    /// fails this call; an optional one is logged and ignored.
    pub async fn seed_module_with(
        &self,
        module: ModuleKey,
        config: SeedConfig,
    ) -> Result<SeedResult, SeedError> {
        let started = Instant::now();
        let resolver = DependencyResolver::new(&self.registry);
        let plan = resolver.resolve(module)?;

        let mut seeded: EnumMap<ModuleKey, Option<SeedResult>> = EnumMap::default();
        if config.seed_dependencies {
            for dependency in plan.iter().copied().filter(|m| *m != module) {
                let needed = resolver.required_records(dependency, &plan);
                let result = self.seed_dependency(&resolver, dependency, needed).await;
                seeded[dependency] = Some(result);
            }
        }

        self.check_dependencies(&resolver, module).await?;

        let mut result = self.seed_locked(module, &config).await?;
        result.dependency_results = self.attach_results(module, &mut seeded);

        info!(
            "Seeded {module} in {}ms: {} created ({} including dependencies)",
            started.elapsed().as_millis(),
            result.created,
            result.total_created()
        );
        Ok(result)
    }

    /// Brings one dependency up to `needed` records. Never fails: errors end
    /// up in the returned result.
    async fn seed_dependency(
        &self,
        resolver: &DependencyResolver<'_>,
        module: ModuleKey,
        needed: usize,
    ) -> SeedResult {
        match self.try_seed_dependency(resolver, module, needed).await {
            Ok(result) => result,
            Err(err) => {
                warn!("Could not seed dependency {module}: {err}");
                SeedResult::failed(module, err)
            }
        }
    }

    async fn try_seed_dependency(
        &self,
        resolver: &DependencyResolver<'_>,
        module: ModuleKey,
        needed: usize,
    ) -> Result<SeedResult, SeedError> {
        let seeder = self.seeder(module)?;
        let found = seeder.count(&self.ctx).await?;
        if found >= needed {
            debug!("Dependency {module} satisfied ({found}/{needed})");
            return Ok(SeedResult::skipped(module, found));
        }

        self.check_dependencies(resolver, module).await?;

        let quantity = self
            .registry
            .default_quantity(module)
            .unwrap_or(needed)
            .max(needed - found);
        let config = SeedConfig::new(quantity)
            .with_batch_size(self.batch_size)
            .with_skip_threshold(needed);
        self.seed_locked(module, &config).await
    }

    /// Fails when a required dependency of `module` has too few records.
    async fn check_dependencies(
        &self,
        resolver: &DependencyResolver<'_>,
        module: ModuleKey,
    ) -> Result<(), SeedError> {
        for status in resolver.check(self.ctx.store(), module).await? {
            if status.satisfied() {
                continue;
            }
            let dependency = status.dependency;
            if dependency.required {
                return Err(SeedError::UnsatisfiedDependency {
                    module,
                    dependency: dependency.module,
                    required: dependency.min_records,
                    found: status.found,
                });
            }
            warn!(
                "Optional dependency {} of {module} has {}/{} record(s); continuing",
                dependency.module, status.found, dependency.min_records
            );
        }
        Ok(())
    }

    /// Runs one module's seeder under its lock, quantity clamped to the
    /// module maximum.
    async fn seed_locked(
        &self,
        module: ModuleKey,
        config: &SeedConfig,
    ) -> Result<SeedResult, SeedError> {
        let seeder = self.seeder(module)?;

        let mut config = *config;
        if let Some(descriptor) = self.registry.get(module) {
            if config.quantity > descriptor.max_quantity {
                warn!(
                    "Clamping {module} quantity {} to maximum {}",
                    config.quantity, descriptor.max_quantity
                );
                config.quantity = descriptor.max_quantity;
            }
        }

        let _guard = self.locks[module].lock().await;
        seeder.seed(&self.ctx, &config).await
    }

    /// Nests dependency results under the module that declared them. A shared
    /// dependency is reported once, under its first dependent.
    fn attach_results(
        &self,
        module: ModuleKey,
        seeded: &mut EnumMap<ModuleKey, Option<SeedResult>>,
    ) -> Vec<SeedResult> {
        let dependencies = self.registry.dependencies(module).unwrap_or_default();

        let mut results = Vec::new();
        for dependency in dependencies {
            if let Some(mut result) = seeded[dependency.module].take() {
                result.dependency_results = self.attach_results(dependency.module, seeded);
                results.push(result);
            }
        }
        results
    }

    /// Deletes the module's records and stats. Config rows stay.
    pub async fn clear_module(&self, module: ModuleKey) -> Result<usize, SeedError> {
        let seeder = self.seeder(module)?;
        let _guard = self.locks[module].lock().await;
        seeder.clear(&self.ctx).await
    }

    pub async fn clear_module_named(&self, name: &str) -> Result<usize, SeedError> {
        self.clear_module(Self::parse(name)?).await
    }

    /// Deletes the module's feature/field/setting rows. Records stay.
    pub async fn clear_module_config(&self, module: ModuleKey) -> Result<usize, SeedError> {
        let seeder = self.seeder(module)?;
        let _guard = self.locks[module].lock().await;
        seeder.clear_config(&self.ctx).await
    }

    /// Clears the module, then seeds it afresh.
    pub async fn reset_module(
        &self,
        module: ModuleKey,
        quantity: usize,
    ) -> Result<SeedResult, SeedError> {
        self.clear_module(module).await?;
        self.seed_module(module, quantity, true).await
    }

    /// Seeds every registered module in dependency order with the preset's
    /// quantities. A failing module is reported in its result and never stops
    /// the run.
    pub async fn seed_preset(&self, preset: Preset, force: bool) -> PresetReport {
        let started = Instant::now();
        info!("Seeding preset '{}'...", preset.as_str());

        let mut results = Vec::new();
        for descriptor in self.registry.modules() {
            let module = descriptor.key;
            let config = SeedConfig::new(descriptor.presets.for_preset(preset))
                .with_force(force)
                .with_batch_size(self.batch_size)
                .with_dependencies(false);

            let result = match self.seed_module_with(module, config).await {
                Ok(result) => result,
                Err(err) => {
                    error!("Preset '{}' failed for {module}: {err}", preset.as_str());
                    SeedResult::failed(module, err)
                }
            };
            results.push(result);
        }

        let report = PresetReport {
            preset,
            results,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!("Preset '{}': {report}", preset.as_str());
        report
    }

    /// Record count and config presence of every registered module.
    pub async fn module_overview(&self) -> Result<Vec<ModuleOverview>, SeedError> {
        let mut overview = Vec::new();
        for descriptor in self.registry.modules() {
            let seeder = self.seeder(descriptor.key)?;
            overview.push(ModuleOverview {
                module: descriptor.key,
                display_name: descriptor.display_name.clone(),
                records: seeder.count(&self.ctx).await?,
                has_config: self.ctx.module_config().exists(descriptor.key).await?,
            });
        }
        Ok(overview)
    }
}
