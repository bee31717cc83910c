//! Homepage section generation.

use async_trait::async_trait;
use platform::models::{FieldType, HomepageSection, SectionKind, SettingValue};
use platform::{Collection, ModuleKey, Store};
use uuid::Uuid;

use super::load_ids;
use crate::db::RecordGenerator;
use crate::error::SeedError;
use crate::faker::{FakeValues, WeightTable};
use crate::module_config::ModuleConfigDefaults;

const KIND: WeightTable<SectionKind> = WeightTable::new(&[
    (SectionKind::Hero, 20),
    (SectionKind::FeaturedProducts, 25),
    (SectionKind::LatestPosts, 25),
    (SectionKind::Newsletter, 15),
    (SectionKind::Testimonials, 15),
]);

const MAX_ITEMS: usize = 4;

fn titles(kind: SectionKind) -> &'static [&'static str] {
    match kind {
        SectionKind::Hero => &["Welcome", "New season, new arrivals", "Made for everyday"],
        SectionKind::FeaturedProducts => &["Featured products", "Staff picks", "Best sellers"],
        SectionKind::LatestPosts => &["From the blog", "Latest stories", "Read more"],
        SectionKind::Newsletter => &["Stay in the loop", "Join our newsletter"],
        SectionKind::Testimonials => &["What customers say", "Loved by thousands"],
    }
}

pub struct HomepageSectionGenerator;

/// Records sections may feature. Both are optional.
pub struct HomepagePool {
    pub product_ids: Vec<Uuid>,
    pub post_ids: Vec<Uuid>,
}

impl HomepagePool {
    fn items_for(&self, kind: SectionKind) -> Option<&[Uuid]> {
        match kind {
            SectionKind::FeaturedProducts => Some(self.product_ids.as_slice()),
            SectionKind::LatestPosts => Some(self.post_ids.as_slice()),
            _ => None,
        }
    }
}

#[async_trait]
impl RecordGenerator for HomepageSectionGenerator {
    type Record = HomepageSection;
    type Pool = HomepagePool;
    const MODULE: ModuleKey = ModuleKey::HomepageSections;

    async fn load_pool(&self, store: &dyn Store) -> Result<HomepagePool, SeedError> {
        Ok(HomepagePool {
            product_ids: load_ids(store, Collection::Products).await?,
            post_ids: load_ids(store, Collection::Posts).await?,
        })
    }

    fn generate_fake(
        &self,
        pool: &HomepagePool,
        faker: &mut dyn FakeValues,
    ) -> Result<HomepageSection, SeedError> {
        let mut kind = KIND.sample(faker);
        // Without anything to feature, fall back to a static section.
        if pool.items_for(kind).is_some_and(|items| items.is_empty()) {
            kind = if faker.chance(0.5) {
                SectionKind::Hero
            } else {
                SectionKind::Newsletter
            };
        }

        let item_ids = match pool.items_for(kind) {
            Some(items) => {
                let start = faker.index(items.len());
                items
                    .iter()
                    .cycle()
                    .skip(start)
                    .take(MAX_ITEMS.min(items.len()))
                    .copied()
                    .collect()
            }
            None => Vec::new(),
        };

        let options = titles(kind);
        Ok(HomepageSection {
            title: options[faker.index(options.len())].to_string(),
            kind,
            position: u32::try_from(faker.int_in(0..=20)).unwrap_or(0),
            visible: faker.chance(0.85),
            item_ids,
        })
    }

    fn validate_record(&self, section: &HomepageSection) -> bool {
        let needs_items = matches!(
            section.kind,
            SectionKind::FeaturedProducts | SectionKind::LatestPosts
        );
        !section.title.trim().is_empty()
            && section.item_ids.len() <= MAX_ITEMS
            && (!needs_items || !section.item_ids.is_empty())
    }

    fn config_defaults(&self) -> ModuleConfigDefaults {
        ModuleConfigDefaults::new(ModuleKey::HomepageSections)
            .system_field("title", "Title", FieldType::Text)
            .system_field("kind", "Kind", FieldType::Select)
            .field("position", "Position", FieldType::Number)
            .field("visible", "Visible", FieldType::Boolean)
            .field("itemIds", "Featured items", FieldType::Reference)
            .linked_feature("featuredItems", "Featured items", true, "itemIds")
            .feature("scheduling", "Scheduled sections", false)
            .setting("maxSections", SettingValue::Number(12.0))
    }
}
