//! Error types for seeding.

use platform::{ModuleKey, StoreError};
use thiserror::Error;

/// Invalid module registry: these are configuration bugs, caught when the
/// registry is built rather than while seeding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("dependency cycle: {}", format_path(.path))]
    Cycle { path: Vec<ModuleKey> },

    #[error("module '{module}' depends on '{dependency}', which is not registered")]
    MissingDependency {
        module: ModuleKey,
        dependency: ModuleKey,
    },

    #[error("module '{0}' is registered more than once")]
    DuplicateModule(ModuleKey),

    #[error("module '{module}' has default quantity {default} above its maximum {max}")]
    InvalidQuantity {
        module: ModuleKey,
        default: usize,
        max: usize,
    },
}

fn format_path(path: &[ModuleKey]) -> String {
    path.iter()
        .map(ModuleKey::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Invalid module config defaults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("module '{module}' declares {kind} '{key}' more than once")]
    DuplicateKey {
        module: ModuleKey,
        kind: &'static str,
        key: String,
    },

    #[error("feature '{feature}' of module '{module}' links unknown field '{field}'")]
    UnknownLinkedField {
        module: ModuleKey,
        feature: String,
        field: String,
    },

    #[error("field '{field}' of module '{module}' links unknown feature '{feature}'")]
    UnknownLinkedFeature {
        module: ModuleKey,
        field: String,
        feature: String,
    },

    #[error("setting '{key}' of module '{module}' is invalid: {reason}")]
    InvalidSetting {
        module: ModuleKey,
        key: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("no seeder registered for module '{0}'")]
    NoSeeder(ModuleKey),

    #[error(
        "cannot seed '{module}': required dependency '{dependency}' has {found} record(s), needs {required}"
    )]
    UnsatisfiedDependency {
        module: ModuleKey,
        dependency: ModuleKey,
        required: usize,
        found: usize,
    },

    #[error("cannot generate '{module}' record: no '{pool}' records to reference")]
    EmptyPool { module: ModuleKey, pool: ModuleKey },

    #[error("seeding '{module}' failed: {message}")]
    Failed { module: ModuleKey, message: String },
}
