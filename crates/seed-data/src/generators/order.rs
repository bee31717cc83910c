//! Order generation.

use std::collections::HashMap;

use async_trait::async_trait;
use platform::models::{Customer, FieldType, Order, OrderLine, OrderStatus, Product, SettingValue};
use platform::{Collection, ModuleKey, Store, StoreExt};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::{load_ids, required_id};
use crate::db::RecordGenerator;
use crate::error::SeedError;
use crate::faker::{FakeValues, WeightTable};
use crate::module_config::ModuleConfigDefaults;

const STATUS: WeightTable<OrderStatus> = WeightTable::new(&[
    (OrderStatus::Pending, 15),
    (OrderStatus::Processing, 20),
    (OrderStatus::Shipped, 20),
    (OrderStatus::Delivered, 35),
    (OrderStatus::Cancelled, 10),
]);

const MAX_LINES: usize = 5;

pub struct OrderGenerator;

/// A purchasable product and its current price.
#[derive(Debug, Clone, Copy)]
pub struct PricedProduct {
    pub id: Uuid,
    pub price_cents: i64,
}

pub struct OrderPool {
    pub customer_ids: Vec<Uuid>,
    pub products: Vec<PricedProduct>,
}

#[async_trait]
impl RecordGenerator for OrderGenerator {
    type Record = Order;
    type Pool = OrderPool;
    const MODULE: ModuleKey = ModuleKey::Orders;

    async fn load_pool(&self, store: &dyn Store) -> Result<OrderPool, SeedError> {
        let products = store
            .all_records::<Product>()
            .await?
            .into_iter()
            .map(|(id, product)| PricedProduct {
                id,
                price_cents: product.price_cents,
            })
            .collect();

        Ok(OrderPool {
            customer_ids: load_ids(store, Collection::Customers).await?,
            products,
        })
    }

    fn generate_fake(&self, pool: &OrderPool, faker: &mut dyn FakeValues) -> Result<Order, SeedError> {
        let customer_id =
            required_id(faker, &pool.customer_ids, ModuleKey::Orders, ModuleKey::Customers)?;
        if pool.products.is_empty() {
            return Err(SeedError::EmptyPool {
                module: ModuleKey::Orders,
                pool: ModuleKey::Products,
            });
        }

        let wanted = (1 + faker.poisson(1.2) as usize).min(MAX_LINES).min(pool.products.len());
        let start = faker.index(pool.products.len());
        let lines: Vec<OrderLine> = pool
            .products
            .iter()
            .cycle()
            .skip(start)
            .take(wanted)
            .map(|product| OrderLine {
                product_id: product.id,
                quantity: u32::try_from(faker.int_in(1..=3)).unwrap_or(1),
                unit_price_cents: product.price_cents,
            })
            .collect();

        let mut order = Order {
            customer_id,
            lines,
            total_cents: 0,
            status: STATUS.sample(faker),
            placed_at: faker.past_datetime(365),
        };
        order.total_cents = order.lines_total();
        Ok(order)
    }

    fn validate_record(&self, order: &Order) -> bool {
        !order.lines.is_empty()
            && order
                .lines
                .iter()
                .all(|line| line.quantity > 0 && line.unit_price_cents > 0)
            && order.total_cents == order.lines_total()
    }

    fn config_defaults(&self) -> ModuleConfigDefaults {
        ModuleConfigDefaults::new(ModuleKey::Orders)
            .system_field("customerId", "Customer", FieldType::Reference)
            .system_field("lines", "Lines", FieldType::Text)
            .system_field("totalCents", "Total", FieldType::Number)
            .field("status", "Status", FieldType::Select)
            .field("placedAt", "Placed at", FieldType::Date)
            .linked_feature("fulfilment", "Fulfilment tracking", true, "status")
            .feature("refunds", "Refunds", false)
            .setting(
                "statuses",
                SettingValue::Structured(json!([
                    "pending",
                    "processing",
                    "shipped",
                    "delivered",
                    "cancelled"
                ])),
            )
            .setting("autoCancelDays", SettingValue::Number(14.0))
    }

    /// Refreshes `customers.orderCount` and `customers.totalSpentCents`.
    /// Cancelled orders count as orders but not as spend.
    async fn after_seed(&self, store: &dyn Store, _created: usize) -> Result<(), SeedError> {
        let mut totals: HashMap<Uuid, (u32, i64)> = HashMap::new();
        for (_, order) in store.all_records::<Order>().await? {
            let entry = totals.entry(order.customer_id).or_default();
            entry.0 += 1;
            if order.status != OrderStatus::Cancelled {
                entry.1 += order.total_cents;
            }
        }

        let mut patched = 0;
        for (id, customer) in store.all_records::<Customer>().await? {
            let (count, spent) = totals.get(&id).copied().unwrap_or_default();
            if customer.order_count != count || customer.total_spent_cents != spent {
                store
                    .patch(
                        Collection::Customers,
                        id,
                        json!({ "orderCount": count, "totalSpentCents": spent }),
                    )
                    .await?;
                patched += 1;
            }
        }

        debug!("Refreshed order totals on {patched} customer(s)");
        Ok(())
    }
}
