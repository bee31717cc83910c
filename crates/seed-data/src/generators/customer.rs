//! Customer generation.

use async_trait::async_trait;
use platform::models::{Address, Customer, FieldType, SettingValue};
use platform::{ModuleKey, Store};

use crate::db::RecordGenerator;
use crate::error::SeedError;
use crate::faker::FakeValues;
use crate::module_config::ModuleConfigDefaults;

pub struct CustomerGenerator;

#[async_trait]
impl RecordGenerator for CustomerGenerator {
    type Record = Customer;
    type Pool = ();
    const MODULE: ModuleKey = ModuleKey::Customers;

    async fn load_pool(&self, _store: &dyn Store) -> Result<(), SeedError> {
        Ok(())
    }

    fn generate_fake(&self, _pool: &(), faker: &mut dyn FakeValues) -> Result<Customer, SeedError> {
        let name = faker.full_name();

        Ok(Customer {
            email: faker.email_for(&name),
            phone: faker.phone(),
            address: Address {
                street: faker.street_address(),
                city: faker.city(),
                postcode: faker.postcode(),
            },
            // Filled in from orders.
            order_count: 0,
            total_spent_cents: 0,
            name,
        })
    }

    fn validate_record(&self, customer: &Customer) -> bool {
        !customer.name.trim().is_empty()
            && customer.email.contains('@')
            && !customer.phone.trim().is_empty()
            && !customer.address.street.trim().is_empty()
            && !customer.address.city.trim().is_empty()
            && !customer.address.postcode.trim().is_empty()
    }

    fn config_defaults(&self) -> ModuleConfigDefaults {
        ModuleConfigDefaults::new(ModuleKey::Customers)
            .system_field("name", "Name", FieldType::Text)
            .system_field("email", "Email", FieldType::Text)
            .field("phone", "Phone", FieldType::Text)
            .field("address", "Address", FieldType::Text)
            .linked_feature("shippingAddress", "Shipping address", true, "address")
            .feature("loyaltyProgram", "Loyalty program", false)
            .setting("guestCheckout", SettingValue::Boolean(true))
    }
}
