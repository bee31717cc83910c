//! Category generation.

use async_trait::async_trait;
use platform::models::{Category, FieldType, SettingValue};
use platform::{ModuleKey, Store};

use crate::db::RecordGenerator;
use crate::error::SeedError;
use crate::faker::{FakeValues, slugify};
use crate::module_config::ModuleConfigDefaults;

const NAMES: &[&str] = &[
    "Technology",
    "Lifestyle",
    "Travel",
    "Food & Drink",
    "Business",
    "Health",
    "Design",
    "Sports",
    "Home & Garden",
    "Fashion",
    "Electronics",
    "Books",
    "Music",
    "Outdoors",
    "Toys",
    "Photography",
    "Science",
    "Finance",
];

pub struct CategoryGenerator;

#[async_trait]
impl RecordGenerator for CategoryGenerator {
    type Record = Category;
    type Pool = ();
    const MODULE: ModuleKey = ModuleKey::Categories;

    async fn load_pool(&self, _store: &dyn Store) -> Result<(), SeedError> {
        Ok(())
    }

    fn generate_fake(&self, _pool: &(), faker: &mut dyn FakeValues) -> Result<Category, SeedError> {
        let name = NAMES[faker.index(NAMES.len())].to_string();
        // Names repeat across a large batch; slugs stay distinct.
        let slug = format!("{}-{}", slugify(&name), faker.int_in(100..=999));

        Ok(Category {
            description: faker.chance(0.8).then(|| faker.sentence(6..14)),
            post_count: 0,
            product_count: 0,
            slug,
            name,
        })
    }

    fn validate_record(&self, category: &Category) -> bool {
        !category.name.trim().is_empty()
            && !category.slug.is_empty()
            && category
                .slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
    }

    fn config_defaults(&self) -> ModuleConfigDefaults {
        ModuleConfigDefaults::new(ModuleKey::Categories)
            .system_field("name", "Name", FieldType::Text)
            .system_field("slug", "Slug", FieldType::Text)
            .field("description", "Description", FieldType::Text)
            .linked_feature("descriptions", "Descriptions", true, "description")
            .feature("nesting", "Nested categories", false)
            .setting("maxDepth", SettingValue::Number(3.0))
    }
}
