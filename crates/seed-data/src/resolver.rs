//! Dependency ordering and satisfaction checks.
//!
//! Ordering is a depth-first post-order walk over declared dependencies with
//! a recursion guard. Every dependency lands before its dependent; a module
//! reachable through several paths appears once.

use enum_map::EnumMap;
use platform::{ModuleKey, Query, Store};
use tracing::debug;

use crate::error::{RegistryError, SeedError};
use crate::registry::{Dependency, ModuleTable, Registry};

/// Modules to seed for `target`, dependencies first and `target` last.
pub fn resolve_order(
    table: &ModuleTable,
    target: ModuleKey,
) -> Result<Vec<ModuleKey>, RegistryError> {
    let mut walk = Walk::default();
    walk.visit(table, target, None)?;
    Ok(walk.order)
}

/// A single order covering every registered module.
pub fn topological_order(table: &ModuleTable) -> Result<Vec<ModuleKey>, RegistryError> {
    let mut walk = Walk::default();
    for module in ModuleKey::ALL {
        if table[module].is_some() {
            walk.visit(table, module, None)?;
        }
    }
    Ok(walk.order)
}

#[derive(Default)]
struct Walk {
    visiting: Vec<ModuleKey>,
    done: EnumMap<ModuleKey, bool>,
    order: Vec<ModuleKey>,
}

impl Walk {
    fn visit(
        &mut self,
        table: &ModuleTable,
        module: ModuleKey,
        parent: Option<ModuleKey>,
    ) -> Result<(), RegistryError> {
        if self.done[module] {
            return Ok(());
        }

        if let Some(start) = self.visiting.iter().position(|m| *m == module) {
            let mut path = self.visiting[start..].to_vec();
            path.push(module);
            return Err(RegistryError::Cycle { path });
        }

        let Some(descriptor) = table[module].as_ref() else {
            return Err(RegistryError::MissingDependency {
                module: parent.unwrap_or(module),
                dependency: module,
            });
        };

        self.visiting.push(module);
        for dependency in &descriptor.dependencies {
            self.visit(table, dependency.module, Some(module))?;
        }
        self.visiting.pop();

        self.done[module] = true;
        self.order.push(module);
        Ok(())
    }
}

/// Current record count behind one dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyStatus {
    pub dependency: Dependency,
    pub found: usize,
}

impl DependencyStatus {
    /// Count-threshold heuristic: enough records exist, whatever their shape.
    pub fn satisfied(&self) -> bool {
        self.found >= self.dependency.min_records
    }
}

/// Resolves seeding plans against a validated [`Registry`].
pub struct DependencyResolver<'a> {
    registry: &'a Registry,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Returns the seeding order for `target`, ending with `target`.
    pub fn resolve(&self, target: ModuleKey) -> Result<Vec<ModuleKey>, SeedError> {
        if !self.registry.contains(target) {
            return Err(SeedError::NoSeeder(target));
        }
        Ok(resolve_order(self.registry.table(), target)?)
    }

    /// Counts the primary records behind each direct dependency of `module`.
    pub async fn check(
        &self,
        store: &dyn Store,
        module: ModuleKey,
    ) -> Result<Vec<DependencyStatus>, SeedError> {
        let dependencies = self
            .registry
            .dependencies(module)
            .ok_or(SeedError::NoSeeder(module))?;

        let mut statuses = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            let found = store
                .count(&Query::new(dependency.module.collection()))
                .await?;
            debug!(
                "{module} -> {}: {found}/{} record(s)",
                dependency.module, dependency.min_records
            );
            statuses.push(DependencyStatus {
                dependency: *dependency,
                found,
            });
        }
        Ok(statuses)
    }

    /// Largest `min_records` any module in `plan` asks of `module`.
    pub fn required_records(&self, module: ModuleKey, plan: &[ModuleKey]) -> usize {
        plan.iter()
            .filter_map(|dependent| self.registry.dependencies(*dependent))
            .flatten()
            .filter(|dependency| dependency.module == module)
            .map(|dependency| dependency.min_records)
            .max()
            .unwrap_or(1)
    }
}
