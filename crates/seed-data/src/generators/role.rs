//! Role generation.

use async_trait::async_trait;
use platform::models::{FieldType, Role, SettingValue};
use platform::{ModuleKey, Store};
use serde_json::json;

use crate::db::RecordGenerator;
use crate::error::SeedError;
use crate::faker::{FakeValues, slugify};
use crate::module_config::ModuleConfigDefaults;

/// Permissions a role may grant.
pub const PERMISSIONS: &[&str] = &[
    "users.read",
    "users.write",
    "content.read",
    "content.write",
    "content.publish",
    "comments.moderate",
    "shop.read",
    "shop.write",
    "orders.manage",
    "settings.manage",
];

struct RoleTemplate {
    name: &'static str,
    description: &'static str,
    permissions: &'static [&'static str],
}

const TEMPLATES: &[RoleTemplate] = &[
    RoleTemplate {
        name: "Administrator",
        description: "Full access to every module",
        permissions: PERMISSIONS,
    },
    RoleTemplate {
        name: "Editor",
        description: "Writes and publishes content",
        permissions: &["content.read", "content.write", "content.publish", "comments.moderate"],
    },
    RoleTemplate {
        name: "Author",
        description: "Writes content for review",
        permissions: &["content.read", "content.write"],
    },
    RoleTemplate {
        name: "Moderator",
        description: "Keeps discussions civil",
        permissions: &["content.read", "comments.moderate"],
    },
    RoleTemplate {
        name: "Shop Manager",
        description: "Runs the catalogue and fulfils orders",
        permissions: &["shop.read", "shop.write", "orders.manage"],
    },
    RoleTemplate {
        name: "Support Agent",
        description: "Helps customers with their orders",
        permissions: &["users.read", "shop.read", "orders.manage"],
    },
    RoleTemplate {
        name: "Viewer",
        description: "Read-only access",
        permissions: &["content.read", "shop.read"],
    },
];

const QUALIFIERS: &[&str] = &["", "Senior ", "Junior ", "Regional ", "Guest "];

pub struct RoleGenerator;

#[async_trait]
impl RecordGenerator for RoleGenerator {
    type Record = Role;
    type Pool = ();
    const MODULE: ModuleKey = ModuleKey::Roles;

    async fn load_pool(&self, _store: &dyn Store) -> Result<(), SeedError> {
        Ok(())
    }

    fn generate_fake(&self, _pool: &(), faker: &mut dyn FakeValues) -> Result<Role, SeedError> {
        let template = &TEMPLATES[faker.index(TEMPLATES.len())];
        let qualifier = QUALIFIERS[faker.index(QUALIFIERS.len())];
        let name = format!("{qualifier}{}", template.name);

        Ok(Role {
            slug: slugify(&name),
            description: template.description.to_string(),
            permissions: template.permissions.iter().map(|p| p.to_string()).collect(),
            is_system: qualifier.is_empty() && template.name == "Administrator",
            user_count: 0,
            name,
        })
    }

    fn validate_record(&self, role: &Role) -> bool {
        !role.name.trim().is_empty()
            && !role.slug.is_empty()
            && !role.permissions.is_empty()
            && role.permissions.iter().all(|p| PERMISSIONS.contains(&p.as_str()))
    }

    fn config_defaults(&self) -> ModuleConfigDefaults {
        ModuleConfigDefaults::new(ModuleKey::Roles)
            .system_field("name", "Name", FieldType::Text)
            .system_field("slug", "Slug", FieldType::Text)
            .field("description", "Description", FieldType::Text)
            .system_field("permissions", "Permissions", FieldType::Select)
            .linked_feature("customPermissions", "Custom permissions", true, "permissions")
            .feature("systemRoles", "Protect system roles", true)
            .setting("defaultRole", SettingValue::Text("viewer".to_string()))
            .setting(
                "availablePermissions",
                SettingValue::Structured(json!(PERMISSIONS)),
            )
    }
}
