//! Derived per-dimension counters.
//!
//! Bulk seeding and clearing always end with [`StatsMaintainer::recompute`],
//! which rewrites a module's counters from a single scan of its primary
//! collection. The incremental `record_*` helpers serve ordinary single-record
//! mutations.

use std::collections::BTreeMap;
use std::sync::Arc;

use platform::models::StatCounter;
use platform::{Collection, ModuleKey, Query, Store, StoreExt};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::SeedError;
use crate::registry::Registry;

/// Counter key holding the number of records in the module.
pub const TOTAL_KEY: &str = "total";

/// Counter key for one value of one tracked field, e.g. `status:approved`.
pub fn dimension_key(field: &str, value: Option<&Value>) -> String {
    let value = match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "none".to_string(),
        Some(other) => other.to_string(),
    };
    format!("{field}:{value}")
}

#[derive(Clone)]
pub struct StatsMaintainer {
    store: Arc<dyn Store>,
    registry: Arc<Registry>,
}

impl StatsMaintainer {
    pub fn new(store: Arc<dyn Store>, registry: Arc<Registry>) -> Self {
        Self { store, registry }
    }

    /// Every counter key a record contributes to, `total` included.
    pub fn dimensions(&self, module: ModuleKey, data: &Map<String, Value>) -> Vec<String> {
        let fields = self
            .registry
            .get(module)
            .map(|d| d.stats_fields.as_slice())
            .unwrap_or_default();

        std::iter::once(TOTAL_KEY.to_string())
            .chain(
                fields
                    .iter()
                    .map(|field| dimension_key(field, data.get(*field))),
            )
            .collect()
    }

    /// Rewrites the module's counters from its current primary records.
    ///
    /// An empty collection leaves no counter rows at all.
    pub async fn recompute(&self, module: ModuleKey) -> Result<Vec<StatCounter>, SeedError> {
        self.clear(module).await?;

        let docs = self
            .store
            .collect(&Query::new(module.collection()))
            .await?;

        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for doc in &docs {
            for key in self.dimensions(module, &doc.data) {
                *counts.entry(key).or_default() += 1;
            }
        }

        let mut counters = Vec::with_capacity(counts.len());
        for (key, count) in counts {
            let counter = StatCounter {
                module_key: module,
                key,
                count,
            };
            self.store.insert_record(&counter).await?;
            counters.push(counter);
        }

        debug!(
            "Recomputed {} counter(s) for {module} over {} record(s)",
            counters.len(),
            docs.len()
        );
        Ok(counters)
    }

    /// Deletes every counter row scoped to the module.
    pub async fn clear(&self, module: ModuleKey) -> Result<usize, SeedError> {
        Ok(self.store.delete_where(&scope(module)).await?)
    }

    pub async fn counters(&self, module: ModuleKey) -> Result<Vec<StatCounter>, SeedError> {
        let records = self.store.records::<StatCounter>(&scope(module)).await?;
        Ok(records.into_iter().map(|(_, counter)| counter).collect())
    }

    /// Value of one counter, zero when the row does not exist.
    pub async fn counter(&self, module: ModuleKey, key: &str) -> Result<u64, SeedError> {
        let doc = self.store.unique(&scope(module).eq("key", key)).await?;
        Ok(match doc {
            Some(doc) => doc.decode::<StatCounter>()?.count,
            None => 0,
        })
    }

    /// Sum of the counters of one field partition, e.g. every `status:*` row.
    pub async fn partition_total(&self, module: ModuleKey, field: &str) -> Result<u64, SeedError> {
        let prefix = format!("{field}:");
        Ok(self
            .counters(module)
            .await?
            .iter()
            .filter(|counter| counter.key.starts_with(&prefix))
            .map(|counter| counter.count)
            .sum())
    }

    /// Counts a record created outside bulk seeding.
    pub async fn record_created(&self, module: ModuleKey, data: &Value) -> Result<(), SeedError> {
        for key in self.dimensions(module, as_object(data)) {
            self.adjust(module, &key, 1).await?;
        }
        Ok(())
    }

    /// Uncounts a record deleted outside bulk clearing.
    pub async fn record_deleted(&self, module: ModuleKey, data: &Value) -> Result<(), SeedError> {
        for key in self.dimensions(module, as_object(data)) {
            self.adjust(module, &key, -1).await?;
        }
        Ok(())
    }

    /// Moves a record between dimension values after an update.
    pub async fn record_updated(
        &self,
        module: ModuleKey,
        before: &Value,
        after: &Value,
    ) -> Result<(), SeedError> {
        let old = self.dimensions(module, as_object(before));
        let new = self.dimensions(module, as_object(after));

        for key in old.iter().filter(|key| !new.contains(key)) {
            self.adjust(module, key, -1).await?;
        }
        for key in new.iter().filter(|key| !old.contains(key)) {
            self.adjust(module, key, 1).await?;
        }
        Ok(())
    }

    async fn adjust(&self, module: ModuleKey, key: &str, delta: i64) -> Result<(), SeedError> {
        let query = scope(module).eq("key", key);

        match self.store.unique(&query).await? {
            Some(doc) => {
                let current = doc.decode::<StatCounter>()?.count;
                let next = if delta < 0 {
                    current.saturating_sub(delta.unsigned_abs())
                } else {
                    current.saturating_add(delta.unsigned_abs())
                };
                self.store
                    .patch(Collection::ModuleStats, doc.id, json!({ "count": next }))
                    .await?;
            }
            None if delta > 0 => {
                self.store
                    .insert_record(&StatCounter {
                        module_key: module,
                        key: key.to_string(),
                        count: delta.unsigned_abs(),
                    })
                    .await?;
            }
            None => {}
        }
        Ok(())
    }
}

fn scope(module: ModuleKey) -> Query {
    Query::new(Collection::ModuleStats).eq("moduleKey", module.as_str())
}

fn as_object(value: &Value) -> &Map<String, Value> {
    static EMPTY: std::sync::LazyLock<Map<String, Value>> = std::sync::LazyLock::new(Map::new);
    value.as_object().unwrap_or(&EMPTY)
}
