//! Static catalogue of seedable modules.
//!
//! The registry is built once, validated (no cycles, no dangling
//! dependencies, sane quantities) and then shared read-only.

use enum_map::EnumMap;
use platform::ModuleKey;
use serde::Serialize;

use crate::config::PresetQuantities;
use crate::error::RegistryError;
use crate::resolver;

/// Module descriptors keyed by module. `None` means the module has no seeder.
pub type ModuleTable = EnumMap<ModuleKey, Option<ModuleDescriptor>>;

/// A declared requirement that `module` holds at least `min_records` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub module: ModuleKey,
    /// Optional dependencies are seeded opportunistically and never block.
    pub required: bool,
    pub min_records: usize,
}

impl Dependency {
    pub const fn required(module: ModuleKey, min_records: usize) -> Self {
        Self {
            module,
            required: true,
            min_records,
        }
    }

    pub const fn optional(module: ModuleKey, min_records: usize) -> Self {
        Self {
            module,
            required: false,
            min_records,
        }
    }
}

/// Metadata of one seedable module.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    pub key: ModuleKey,
    pub display_name: String,
    pub dependencies: Vec<Dependency>,
    pub default_quantity: usize,
    pub max_quantity: usize,
    pub presets: PresetQuantities,
    /// Record fields counted per value by the stats maintainer.
    pub stats_fields: Vec<&'static str>,
}

impl ModuleDescriptor {
    pub fn new(key: ModuleKey, display_name: impl Into<String>) -> Self {
        Self {
            key,
            display_name: display_name.into(),
            dependencies: Vec::new(),
            default_quantity: 10,
            max_quantity: 100,
            presets: PresetQuantities::new(5, 20, 100, 50),
            stats_fields: Vec::new(),
        }
    }

    pub fn depends_on(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn quantities(mut self, default_quantity: usize, max_quantity: usize) -> Self {
        self.default_quantity = default_quantity;
        self.max_quantity = max_quantity;
        self
    }

    pub fn presets(mut self, presets: PresetQuantities) -> Self {
        self.presets = presets;
        self
    }

    pub fn stats(mut self, fields: &[&'static str]) -> Self {
        self.stats_fields = fields.to_vec();
        self
    }
}

/// Validated, immutable module catalogue.
#[derive(Debug, Clone)]
pub struct Registry {
    modules: ModuleTable,
    order: Vec<ModuleKey>,
}

impl Registry {
    /// Builds a registry, rejecting duplicates, bad quantities, dangling
    /// dependencies and cycles.
    pub fn new(
        descriptors: impl IntoIterator<Item = ModuleDescriptor>,
    ) -> Result<Self, RegistryError> {
        let mut modules = ModuleTable::default();

        for descriptor in descriptors {
            if descriptor.default_quantity > descriptor.max_quantity {
                return Err(RegistryError::InvalidQuantity {
                    module: descriptor.key,
                    default: descriptor.default_quantity,
                    max: descriptor.max_quantity,
                });
            }
            let key = descriptor.key;
            if modules[key].replace(descriptor).is_some() {
                return Err(RegistryError::DuplicateModule(key));
            }
        }

        let order = resolver::topological_order(&modules)?;
        Ok(Self { modules, order })
    }

    /// The platform's built-in modules.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new(builtin_descriptors())
    }

    pub fn get(&self, key: ModuleKey) -> Option<&ModuleDescriptor> {
        self.modules[key].as_ref()
    }

    /// Looks up a module by its UI key. Unknown or unregistered keys yield `None`.
    pub fn lookup(&self, name: &str) -> Option<&ModuleDescriptor> {
        ModuleKey::parse(name).and_then(|key| self.get(key))
    }

    pub fn contains(&self, key: ModuleKey) -> bool {
        self.modules[key].is_some()
    }

    /// Declared dependencies, `None` when the module is not registered.
    pub fn dependencies(&self, key: ModuleKey) -> Option<&[Dependency]> {
        self.get(key).map(|d| d.dependencies.as_slice())
    }

    pub fn default_quantity(&self, key: ModuleKey) -> Option<usize> {
        self.get(key).map(|d| d.default_quantity)
    }

    /// Every registered module, dependencies before dependents.
    pub fn seeding_order(&self) -> &[ModuleKey] {
        &self.order
    }

    /// Registered descriptors in seeding order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleDescriptor> + '_ {
        self.order.iter().filter_map(|key| self.get(*key))
    }

    pub fn table(&self) -> &ModuleTable {
        &self.modules
    }
}

/// Descriptors of the built-in modules.
pub fn builtin_descriptors() -> Vec<ModuleDescriptor> {
    use ModuleKey::*;

    vec![
        ModuleDescriptor::new(Roles, "Roles")
            .quantities(5, 20)
            .presets(PresetQuantities::new(5, 6, 12, 8))
            .stats(&["isSystem"]),
        ModuleDescriptor::new(Users, "Users")
            .depends_on(Dependency::required(Roles, 1))
            .quantities(20, 500)
            .presets(PresetQuantities::new(8, 25, 150, 50))
            .stats(&["status"]),
        ModuleDescriptor::new(Categories, "Categories")
            .quantities(8, 50)
            .presets(PresetQuantities::new(5, 20, 40, 12)),
        ModuleDescriptor::new(Posts, "Posts")
            .depends_on(Dependency::required(Users, 1))
            .depends_on(Dependency::optional(Categories, 1))
            .quantities(20, 500)
            .presets(PresetQuantities::new(8, 25, 150, 50))
            .stats(&["status"]),
        ModuleDescriptor::new(Comments, "Comments")
            .depends_on(Dependency::required(Posts, 1))
            .depends_on(Dependency::optional(Users, 1))
            .quantities(50, 1000)
            .presets(PresetQuantities::new(10, 30, 300, 50))
            .stats(&["status"]),
        ModuleDescriptor::new(Menus, "Menus")
            .depends_on(Dependency::optional(Categories, 1))
            .quantities(3, 12)
            .presets(PresetQuantities::new(5, 6, 12, 8))
            .stats(&["location"]),
        ModuleDescriptor::new(Notifications, "Notifications")
            .depends_on(Dependency::required(Users, 1))
            .quantities(30, 1000)
            .presets(PresetQuantities::new(10, 30, 200, 50))
            .stats(&["kind", "read"]),
        ModuleDescriptor::new(Products, "Products")
            .depends_on(Dependency::optional(Categories, 1))
            .quantities(20, 500)
            .presets(PresetQuantities::new(8, 25, 150, 50))
            .stats(&["status"]),
        ModuleDescriptor::new(Customers, "Customers")
            .quantities(20, 500)
            .presets(PresetQuantities::new(8, 25, 150, 50)),
        ModuleDescriptor::new(Orders, "Orders")
            .depends_on(Dependency::required(Customers, 1))
            .depends_on(Dependency::required(Products, 1))
            .quantities(30, 1000)
            .presets(PresetQuantities::new(10, 30, 200, 50))
            .stats(&["status"]),
        ModuleDescriptor::new(HomepageSections, "Homepage Sections")
            .depends_on(Dependency::optional(Products, 1))
            .depends_on(Dependency::optional(Posts, 1))
            .quantities(5, 12)
            .presets(PresetQuantities::new(5, 6, 12, 8))
            .stats(&["kind"]),
    ]
}
