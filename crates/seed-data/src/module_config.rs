//! Default feature/field/setting rows of each module.
//!
//! The triple is seeded once per module and left alone afterwards, so admin
//! edits survive any number of data reseeds. Clearing it is an explicit,
//! separate operation.

use std::collections::HashSet;
use std::sync::Arc;

use platform::models::{FieldType, ModuleFeature, ModuleField, ModuleSetting, SettingValue};
use platform::{Collection, ModuleKey, Query, Store, StoreExt};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ConfigError, SeedError};

/// Default config rows of one module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleConfigDefaults {
    pub module: ModuleKey,
    pub features: Vec<ModuleFeature>,
    pub fields: Vec<ModuleField>,
    pub settings: Vec<ModuleSetting>,
}

impl ModuleConfigDefaults {
    pub fn new(module: ModuleKey) -> Self {
        Self {
            module,
            features: Vec::new(),
            fields: Vec::new(),
            settings: Vec::new(),
        }
    }

    pub fn feature(mut self, key: &str, name: &str, enabled: bool) -> Self {
        self.features.push(ModuleFeature {
            module_key: self.module,
            feature_key: key.to_string(),
            name: name.to_string(),
            enabled,
            linked_field_key: None,
        });
        self
    }

    /// A feature that shows or hides `field`. The field is linked back.
    pub fn linked_feature(mut self, key: &str, name: &str, enabled: bool, field: &str) -> Self {
        self.features.push(ModuleFeature {
            module_key: self.module,
            feature_key: key.to_string(),
            name: name.to_string(),
            enabled,
            linked_field_key: Some(field.to_string()),
        });
        if let Some(existing) = self.fields.iter_mut().find(|f| f.field_key == field) {
            existing.linked_feature = Some(key.to_string());
        }
        self
    }

    /// An optional, admin-editable field.
    pub fn field(self, key: &str, name: &str, field_type: FieldType) -> Self {
        self.push_field(key, name, field_type, false, false)
    }

    /// A required system field that admins cannot disable.
    pub fn system_field(self, key: &str, name: &str, field_type: FieldType) -> Self {
        self.push_field(key, name, field_type, true, true)
    }

    fn push_field(
        mut self,
        key: &str,
        name: &str,
        field_type: FieldType,
        required: bool,
        is_system: bool,
    ) -> Self {
        let order = u32::try_from(self.fields.len()).unwrap_or(u32::MAX);
        let linked_feature = self
            .features
            .iter()
            .find(|f| f.linked_field_key.as_deref() == Some(key))
            .map(|f| f.feature_key.clone());

        self.fields.push(ModuleField {
            module_key: self.module,
            field_key: key.to_string(),
            name: name.to_string(),
            field_type,
            enabled: true,
            required,
            is_system,
            linked_feature,
            order,
        });
        self
    }

    pub fn setting(mut self, key: &str, value: SettingValue) -> Self {
        self.settings.push(ModuleSetting {
            module_key: self.module,
            setting_key: key.to_string(),
            value,
        });
        self
    }

    /// Checks key uniqueness, feature/field links and setting values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let module = self.module;

        let feature_keys = unique_keys(
            module,
            "feature",
            self.features.iter().map(|f| f.feature_key.as_str()),
        )?;
        let field_keys = unique_keys(
            module,
            "field",
            self.fields.iter().map(|f| f.field_key.as_str()),
        )?;
        unique_keys(
            module,
            "setting",
            self.settings.iter().map(|s| s.setting_key.as_str()),
        )?;

        for feature in &self.features {
            if let Some(field) = &feature.linked_field_key {
                if !field_keys.contains(field.as_str()) {
                    return Err(ConfigError::UnknownLinkedField {
                        module,
                        feature: feature.feature_key.clone(),
                        field: field.clone(),
                    });
                }
            }
        }

        for field in &self.fields {
            if let Some(feature) = &field.linked_feature {
                if !feature_keys.contains(feature.as_str()) {
                    return Err(ConfigError::UnknownLinkedFeature {
                        module,
                        field: field.field_key.clone(),
                        feature: feature.clone(),
                    });
                }
            }
        }

        for setting in &self.settings {
            let reason = match &setting.value {
                SettingValue::Number(n) if !n.is_finite() => Some("number is not finite"),
                SettingValue::Structured(v) if !(v.is_array() || v.is_object()) => {
                    Some("structured value must be an array or object")
                }
                _ => None,
            };
            if let Some(reason) = reason {
                return Err(ConfigError::InvalidSetting {
                    module,
                    key: setting.setting_key.clone(),
                    reason: reason.to_string(),
                });
            }
        }

        Ok(())
    }
}

fn unique_keys<'a>(
    module: ModuleKey,
    kind: &'static str,
    keys: impl Iterator<Item = &'a str>,
) -> Result<HashSet<&'a str>, ConfigError> {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(ConfigError::DuplicateKey {
                module,
                kind,
                key: key.to_string(),
            });
        }
    }
    Ok(seen)
}

/// Outcome of [`ModuleConfigSeeder::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum ConfigSeedOutcome {
    Inserted {
        features: usize,
        fields: usize,
        settings: usize,
    },
    AlreadyPresent,
}

/// Stored config rows of one module.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    pub features: Vec<ModuleFeature>,
    pub fields: Vec<ModuleField>,
    pub settings: Vec<ModuleSetting>,
}

impl ModuleConfig {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty() && self.fields.is_empty() && self.settings.is_empty()
    }
}

const CONFIG_COLLECTIONS: [Collection; 3] = [
    Collection::ModuleFeatures,
    Collection::ModuleFields,
    Collection::ModuleSettings,
];

#[derive(Clone)]
pub struct ModuleConfigSeeder {
    store: Arc<dyn Store>,
}

impl ModuleConfigSeeder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Whether any config row of the module exists.
    pub async fn exists(&self, module: ModuleKey) -> Result<bool, SeedError> {
        for collection in CONFIG_COLLECTIONS {
            if self.store.first(&scope(collection, module)).await?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Inserts `defaults` unless the module already has config rows.
    pub async fn ensure(
        &self,
        defaults: &ModuleConfigDefaults,
    ) -> Result<ConfigSeedOutcome, SeedError> {
        let module = defaults.module;
        if self.exists(module).await? {
            debug!("Config for {module} already present");
            return Ok(ConfigSeedOutcome::AlreadyPresent);
        }

        defaults.validate()?;

        for feature in &defaults.features {
            self.store.insert_record(feature).await?;
        }
        for field in &defaults.fields {
            self.store.insert_record(field).await?;
        }
        for setting in &defaults.settings {
            self.store.insert_record(setting).await?;
        }

        info!(
            "Seeded config for {module}: {} feature(s), {} field(s), {} setting(s)",
            defaults.features.len(),
            defaults.fields.len(),
            defaults.settings.len()
        );
        Ok(ConfigSeedOutcome::Inserted {
            features: defaults.features.len(),
            fields: defaults.fields.len(),
            settings: defaults.settings.len(),
        })
    }

    /// Loads the stored triple, fields in display order.
    pub async fn load(&self, module: ModuleKey) -> Result<ModuleConfig, SeedError> {
        let features = self
            .store
            .records::<ModuleFeature>(&scope(Collection::ModuleFeatures, module))
            .await?;
        let mut fields = self
            .store
            .records::<ModuleField>(&scope(Collection::ModuleFields, module))
            .await?;
        let settings = self
            .store
            .records::<ModuleSetting>(&scope(Collection::ModuleSettings, module))
            .await?;

        fields.sort_by_key(|(_, field)| field.order);

        Ok(ModuleConfig {
            features: features.into_iter().map(|(_, f)| f).collect(),
            fields: fields.into_iter().map(|(_, f)| f).collect(),
            settings: settings.into_iter().map(|(_, s)| s).collect(),
        })
    }

    /// Deletes every config row of the module and returns how many went.
    pub async fn clear(&self, module: ModuleKey) -> Result<usize, SeedError> {
        let mut deleted = 0;
        for collection in CONFIG_COLLECTIONS {
            deleted += self.store.delete_where(&scope(collection, module)).await?;
        }
        info!("Cleared {deleted} config row(s) for {module}");
        Ok(deleted)
    }
}

fn scope(collection: Collection, module: ModuleKey) -> Query {
    Query::new(collection).eq("moduleKey", module.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::MemoryStore;
    use serde_json::json;

    fn defaults() -> ModuleConfigDefaults {
        ModuleConfigDefaults::new(ModuleKey::Comments)
            .system_field("content", "Content", FieldType::RichText)
            .field("status", "Status", FieldType::Select)
            .linked_feature("moderation", "Moderation", true, "status")
            .setting("autoApprove", SettingValue::Boolean(false))
            .setting("blockedWords", SettingValue::Structured(json!(["spam"])))
    }

    #[test]
    fn test_linked_feature_links_field_back() {
        let defaults = defaults();
        let status = defaults
            .fields
            .iter()
            .find(|f| f.field_key == "status")
            .unwrap();

        assert_eq!(status.linked_feature.as_deref(), Some("moderation"));
        assert_eq!(status.order, 1);
        assert!(defaults.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let defaults = defaults().field("content", "Body", FieldType::Text);
        assert!(matches!(
            defaults.validate(),
            Err(ConfigError::DuplicateKey { kind: "field", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_dangling_link() {
        let defaults = ModuleConfigDefaults::new(ModuleKey::Posts).linked_feature(
            "tags",
            "Tags",
            true,
            "tagList",
        );
        assert!(matches!(
            defaults.validate(),
            Err(ConfigError::UnknownLinkedField { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let defaults = ModuleConfigDefaults::new(ModuleKey::Products)
            .setting("lowStock", SettingValue::Number(f64::NAN));
        assert!(matches!(
            defaults.validate(),
            Err(ConfigError::InvalidSetting { .. })
        ));

        let defaults = ModuleConfigDefaults::new(ModuleKey::Products)
            .setting("currencies", SettingValue::Structured(json!("EUR")));
        assert!(defaults.validate().is_err());
    }

    #[tokio::test]
    async fn test_ensure_inserts_once() {
        let store = Arc::new(MemoryStore::new());
        let seeder = ModuleConfigSeeder::new(store.clone());

        let first = seeder.ensure(&defaults()).await.unwrap();
        let second = seeder.ensure(&defaults()).await.unwrap();

        assert_eq!(
            first,
            ConfigSeedOutcome::Inserted {
                features: 1,
                fields: 2,
                settings: 2
            }
        );
        assert_eq!(second, ConfigSeedOutcome::AlreadyPresent);
        assert_eq!(
            store
                .count(&Query::new(Collection::ModuleFields))
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_ensure_leaves_partial_config_alone() {
        let store = Arc::new(MemoryStore::new());
        let seeder = ModuleConfigSeeder::new(store.clone());
        seeder.ensure(&defaults()).await.unwrap();

        // An admin removed every field; features and settings remain.
        store
            .delete_where(&scope(Collection::ModuleFields, ModuleKey::Comments))
            .await
            .unwrap();

        assert_eq!(
            seeder.ensure(&defaults()).await.unwrap(),
            ConfigSeedOutcome::AlreadyPresent
        );
        assert!(seeder.load(ModuleKey::Comments).await.unwrap().fields.is_empty());
    }

    #[tokio::test]
    async fn test_clear_is_scoped_to_module() {
        let store = Arc::new(MemoryStore::new());
        let seeder = ModuleConfigSeeder::new(store.clone());
        seeder.ensure(&defaults()).await.unwrap();
        seeder
            .ensure(
                &ModuleConfigDefaults::new(ModuleKey::Posts).feature("tags", "Tags", true),
            )
            .await
            .unwrap();

        let deleted = seeder.clear(ModuleKey::Comments).await.unwrap();

        assert_eq!(deleted, 5);
        assert!(!seeder.exists(ModuleKey::Comments).await.unwrap());
        assert!(seeder.exists(ModuleKey::Posts).await.unwrap());
        assert!(seeder.load(ModuleKey::Comments).await.unwrap().is_empty());
    }
}
