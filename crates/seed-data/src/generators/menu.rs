//! Navigation menu generation.

use std::collections::HashSet;

use async_trait::async_trait;
use platform::models::{Category, FieldType, Menu, MenuItem, MenuLocation, SettingValue};
use platform::{ModuleKey, Store, StoreExt};

use crate::db::RecordGenerator;
use crate::error::SeedError;
use crate::faker::{FakeValues, WeightTable};
use crate::module_config::ModuleConfigDefaults;

const LOCATION: WeightTable<MenuLocation> = WeightTable::new(&[
    (MenuLocation::Header, 40),
    (MenuLocation::Footer, 40),
    (MenuLocation::Sidebar, 20),
]);

const HEADER_LINKS: &[(&str, &str)] = &[
    ("Home", "/"),
    ("Blog", "/blog"),
    ("Shop", "/shop"),
    ("About", "/about"),
    ("Contact", "/contact"),
];

const FOOTER_LINKS: &[(&str, &str)] = &[
    ("Privacy", "/privacy"),
    ("Terms", "/terms"),
    ("FAQ", "/faq"),
    ("Shipping", "/shipping"),
    ("Contact", "/contact"),
];

const SIDEBAR_LINKS: &[(&str, &str)] = &[
    ("Latest posts", "/blog/latest"),
    ("Popular", "/blog/popular"),
    ("Archive", "/blog/archive"),
];

pub struct MenuGenerator;

/// Category links menus may point at.
pub struct MenuPool {
    pub categories: Vec<(String, String)>,
}

#[async_trait]
impl RecordGenerator for MenuGenerator {
    type Record = Menu;
    type Pool = MenuPool;
    const MODULE: ModuleKey = ModuleKey::Menus;

    async fn load_pool(&self, store: &dyn Store) -> Result<MenuPool, SeedError> {
        let categories = store
            .all_records::<Category>()
            .await?
            .into_iter()
            .map(|(_, category)| (category.name, category.slug))
            .collect();
        Ok(MenuPool { categories })
    }

    fn generate_fake(&self, pool: &MenuPool, faker: &mut dyn FakeValues) -> Result<Menu, SeedError> {
        let location = LOCATION.sample(faker);
        let (name, links) = match location {
            MenuLocation::Header => ("Main navigation", HEADER_LINKS),
            MenuLocation::Footer => ("Footer links", FOOTER_LINKS),
            MenuLocation::Sidebar => ("Sidebar", SIDEBAR_LINKS),
        };

        let mut items: Vec<(String, String)> = links
            .iter()
            .filter(|_| faker.chance(0.85))
            .map(|(label, url)| (label.to_string(), url.to_string()))
            .collect();

        if location != MenuLocation::Footer && !pool.categories.is_empty() {
            let wanted = faker.int_in(1..=3) as usize;
            let start = faker.index(pool.categories.len());
            items.extend(
                pool.categories
                    .iter()
                    .cycle()
                    .skip(start)
                    .take(wanted.min(pool.categories.len()))
                    .map(|(label, slug)| (label.clone(), format!("/category/{slug}"))),
            );
        }

        if items.is_empty() {
            items.push(("Home".to_string(), "/".to_string()));
        }

        Ok(Menu {
            name: name.to_string(),
            location,
            items: items
                .into_iter()
                .zip(0u32..)
                .map(|((label, url), position)| MenuItem {
                    label,
                    url,
                    position,
                })
                .collect(),
            is_active: faker.chance(0.8),
        })
    }

    fn validate_record(&self, menu: &Menu) -> bool {
        let mut positions = HashSet::new();
        !menu.items.is_empty()
            && menu.items.iter().all(|item| {
                !item.label.trim().is_empty()
                    && (item.url.starts_with('/') || item.url.starts_with("http"))
                    && positions.insert(item.position)
            })
    }

    fn config_defaults(&self) -> ModuleConfigDefaults {
        ModuleConfigDefaults::new(ModuleKey::Menus)
            .system_field("name", "Name", FieldType::Text)
            .system_field("location", "Location", FieldType::Select)
            .system_field("items", "Items", FieldType::Text)
            .field("isActive", "Active", FieldType::Boolean)
            .feature("nestedItems", "Nested items", false)
            .setting("maxItems", SettingValue::Number(12.0))
            .setting(
                "locations",
                SettingValue::Structured(serde_json::json!(["header", "footer", "sidebar"])),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faker::{Locale, LocaleFaker};

    #[test]
    fn test_menus_link_existing_categories() {
        let pool = MenuPool {
            categories: vec![("Travel".to_string(), "travel-120".to_string())],
        };
        let mut faker = LocaleFaker::seeded(Locale::En, 8);

        for _ in 0..30 {
            let menu = MenuGenerator.generate_fake(&pool, &mut faker).unwrap();
            assert!(MenuGenerator.validate_record(&menu), "{menu:?}");
            for item in menu.items.iter().filter(|i| i.url.starts_with("/category/")) {
                assert_eq!(item.url, "/category/travel-120");
            }
        }
    }

    #[test]
    fn test_duplicate_positions_rejected() {
        let menu = Menu {
            name: "Main".to_string(),
            location: MenuLocation::Header,
            items: vec![
                MenuItem {
                    label: "Home".to_string(),
                    url: "/".to_string(),
                    position: 0,
                },
                MenuItem {
                    label: "Blog".to_string(),
                    url: "/blog".to_string(),
                    position: 0,
                },
            ],
            is_active: true,
        };
        assert!(!MenuGenerator.validate_record(&menu));
    }
}
