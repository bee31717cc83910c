//! Seed script - fills the platform database with sample data
//!
//! Run with:
//! ```
//! cargo run -p seed-data --bin seed
//! ```
//!
//! Seeds the `standard` preset by default. `SEED_MODULE=comments` seeds one
//! module (plus its dependencies), `SEED_CLEAR=1` clears it instead.

use std::sync::Arc;

use anyhow::Context;
use seed_data::config::SeedSettings;
use seed_data::manager::{ManagerOptions, SeedManager};
use seed_data::registry::Registry;
use seed_data::{ModuleKey, PgStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = SeedSettings::from_env();

    let store = PgStore::connect(&settings.database_url)
        .await
        .context("connecting to database")?;
    store.migrate().await.context("running migrations")?;

    tracing::info!("Connected to database");

    let registry = Arc::new(Registry::builtin()?);
    let manager = SeedManager::new(
        Arc::new(store),
        registry.clone(),
        ManagerOptions {
            batch_size: settings.batch_size,
            locale: settings.locale,
            rng_seed: settings.rng_seed,
        },
    );

    let Some(name) = settings.module.as_deref() else {
        let report = manager.seed_preset(settings.preset, settings.force).await;

        tracing::info!("Seed completed: {report}");
        for result in &report.results {
            tracing::info!(
                "  {}: {} created, {} skipped, {} rejected",
                result.module,
                result.created,
                result.skipped,
                result.invalid
            );
        }
        for failed in report.failed() {
            tracing::error!("  {} failed: {}", failed.module, failed.errors.join("; "));
        }
        return Ok(());
    };

    let module = ModuleKey::parse(name).with_context(|| format!("unknown module '{name}'"))?;

    if settings.clear {
        let deleted = manager.clear_module(module).await?;
        tracing::info!("Cleared {deleted} {module} record(s)");
        return Ok(());
    }

    let quantity = settings
        .quantity
        .or_else(|| registry.default_quantity(module))
        .unwrap_or(10);
    let result = manager.seed_module(module, quantity, settings.force).await?;

    tracing::info!("Seed completed!");
    tracing::info!("  {}: {} created", result.module, result.created);
    tracing::info!("  Including dependencies: {}", result.total_created());
    tracing::info!("  Took {}ms", result.duration_ms);

    Ok(())
}
