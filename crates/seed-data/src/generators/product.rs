//! Product catalogue generation.

use async_trait::async_trait;
use platform::models::{FieldType, Product, ProductStatus, SettingValue};
use platform::{Collection, ModuleKey, Store};
use uuid::Uuid;

use super::{load_ids, refresh_reference_counts};
use crate::db::RecordGenerator;
use crate::error::SeedError;
use crate::faker::{FakeValues, WeightTable, pick};
use crate::module_config::ModuleConfigDefaults;

const STATUS: WeightTable<ProductStatus> = WeightTable::new(&[
    (ProductStatus::Active, 75),
    (ProductStatus::Draft, 15),
    (ProductStatus::OutOfStock, 10),
]);

const ADJECTIVES: &[&str] = &[
    "Ergonomic",
    "Rustic",
    "Sleek",
    "Handmade",
    "Refined",
    "Practical",
    "Compact",
    "Vintage",
    "Modern",
    "Durable",
];

const NOUNS: &[&str] = &[
    "Chair", "Lamp", "Backpack", "Mug", "Notebook", "Headphones", "Jacket", "Kettle", "Watch",
    "Desk", "Blanket", "Speaker",
];

/// Median price in cents; prices are log-normally spread around it.
const MEDIAN_PRICE_CENTS: f64 = 3_500.0;

pub struct ProductGenerator;

pub struct ProductPool {
    /// Optional: products stay uncategorised when empty.
    pub category_ids: Vec<Uuid>,
}

#[async_trait]
impl RecordGenerator for ProductGenerator {
    type Record = Product;
    type Pool = ProductPool;
    const MODULE: ModuleKey = ModuleKey::Products;

    async fn load_pool(&self, store: &dyn Store) -> Result<ProductPool, SeedError> {
        Ok(ProductPool {
            category_ids: load_ids(store, Collection::Categories).await?,
        })
    }

    fn generate_fake(
        &self,
        pool: &ProductPool,
        faker: &mut dyn FakeValues,
    ) -> Result<Product, SeedError> {
        let name = format!(
            "{} {}",
            ADJECTIVES[faker.index(ADJECTIVES.len())],
            NOUNS[faker.index(NOUNS.len())]
        );
        let status = STATUS.sample(faker);
        let stock = match status {
            ProductStatus::OutOfStock => 0,
            _ => u32::try_from(faker.int_in(1..=500)).unwrap_or(1),
        };

        Ok(Product {
            name,
            sku: format!("SKU-{:05}", faker.int_in(0..=99_999)),
            description: faker.paragraph(1..3),
            price_cents: price_cents(faker),
            stock,
            category_id: pick(faker, &pool.category_ids).copied(),
            status,
        })
    }

    fn validate_record(&self, product: &Product) -> bool {
        !product.name.trim().is_empty()
            && product.sku.starts_with("SKU-")
            && product.price_cents > 0
            && (product.status == ProductStatus::OutOfStock) == (product.stock == 0)
    }

    fn config_defaults(&self) -> ModuleConfigDefaults {
        ModuleConfigDefaults::new(ModuleKey::Products)
            .system_field("name", "Name", FieldType::Text)
            .system_field("sku", "SKU", FieldType::Text)
            .field("description", "Description", FieldType::RichText)
            .system_field("priceCents", "Price", FieldType::Number)
            .field("stock", "Stock", FieldType::Number)
            .field("categoryId", "Category", FieldType::Reference)
            .field("status", "Status", FieldType::Select)
            .linked_feature("inventory", "Inventory tracking", true, "stock")
            .linked_feature("categories", "Categories", true, "categoryId")
            .setting("currency", SettingValue::Text("EUR".to_string()))
            .setting("lowStockThreshold", SettingValue::Number(5.0))
    }

    /// Keeps `categories.productCount` in step.
    async fn after_seed(&self, store: &dyn Store, _created: usize) -> Result<(), SeedError> {
        refresh_reference_counts(
            store,
            Collection::Categories,
            Collection::Products,
            "categoryId",
            "productCount",
        )
        .await
    }
}

/// A log-normal price rounded to end in 99 cents.
fn price_cents(faker: &mut dyn FakeValues) -> i64 {
    let raw = faker.log_normal(MEDIAN_PRICE_CENTS, 0.8);
    let cents = (raw.clamp(199.0, 250_000.0) as i64 / 100) * 100 - 1;
    cents.max(99)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faker::{Locale, LocaleFaker};

    #[test]
    fn test_generated_products_are_valid() {
        let pool = ProductPool {
            category_ids: vec![Uuid::new_v4()],
        };
        let mut faker = LocaleFaker::seeded(Locale::En, 17);

        for _ in 0..50 {
            let product = ProductGenerator.generate_fake(&pool, &mut faker).unwrap();
            assert!(ProductGenerator.validate_record(&product), "{product:?}");
            assert_eq!(product.category_id, Some(pool.category_ids[0]));
            assert_eq!(product.price_cents % 100, 99);
        }
    }

    #[test]
    fn test_prices_cluster_around_median() {
        let mut faker = LocaleFaker::seeded(Locale::En, 17);
        let mut prices: Vec<i64> = (0..500).map(|_| price_cents(&mut faker)).collect();
        prices.sort_unstable();

        let median = prices[prices.len() / 2];
        assert!((2_000..6_000).contains(&median), "median {median}");
    }

    #[test]
    fn test_out_of_stock_requires_zero_stock() {
        let pool = ProductPool {
            category_ids: vec![],
        };
        let mut faker = LocaleFaker::seeded(Locale::En, 17);
        let mut product = ProductGenerator.generate_fake(&pool, &mut faker).unwrap();
        product.status = ProductStatus::OutOfStock;
        product.stock = 3;
        assert!(!ProductGenerator.validate_record(&product));
    }
}
