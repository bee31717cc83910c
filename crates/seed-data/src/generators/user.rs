//! User generation.

use async_trait::async_trait;
use platform::models::{FieldType, SettingValue, User, UserStatus};
use platform::{Collection, ModuleKey, Store};
use uuid::Uuid;

use super::{load_ids, refresh_reference_counts, required_id};
use crate::db::RecordGenerator;
use crate::error::SeedError;
use crate::faker::{FakeValues, WeightTable};
use crate::module_config::ModuleConfigDefaults;

const STATUS: WeightTable<UserStatus> = WeightTable::new(&[
    (UserStatus::Active, 80),
    (UserStatus::Inactive, 15),
    (UserStatus::Suspended, 5),
]);

pub struct UserGenerator;

/// Ids of the roles users can be assigned to.
pub struct UserPool {
    pub role_ids: Vec<Uuid>,
}

#[async_trait]
impl RecordGenerator for UserGenerator {
    type Record = User;
    type Pool = UserPool;
    const MODULE: ModuleKey = ModuleKey::Users;

    async fn load_pool(&self, store: &dyn Store) -> Result<UserPool, SeedError> {
        Ok(UserPool {
            role_ids: load_ids(store, Collection::Roles).await?,
        })
    }

    fn generate_fake(&self, pool: &UserPool, faker: &mut dyn FakeValues) -> Result<User, SeedError> {
        let role_id = required_id(faker, &pool.role_ids, ModuleKey::Users, ModuleKey::Roles)?;
        let name = faker.full_name();

        Ok(User {
            email: faker.email_for(&name),
            role_id,
            status: STATUS.sample(faker),
            phone: faker.chance(0.6).then(|| faker.phone()),
            city: faker.chance(0.7).then(|| faker.city()),
            joined_at: faker.past_datetime(730),
            name,
        })
    }

    fn validate_record(&self, user: &User) -> bool {
        !user.name.trim().is_empty()
            && user.email.contains('@')
            && user.email.contains('.')
            && !user.role_id.is_nil()
    }

    fn config_defaults(&self) -> ModuleConfigDefaults {
        ModuleConfigDefaults::new(ModuleKey::Users)
            .system_field("name", "Name", FieldType::Text)
            .system_field("email", "Email", FieldType::Text)
            .system_field("roleId", "Role", FieldType::Reference)
            .field("status", "Status", FieldType::Select)
            .field("phone", "Phone", FieldType::Text)
            .field("city", "City", FieldType::Text)
            .feature("selfRegistration", "Self registration", false)
            .linked_feature("accountSuspension", "Account suspension", true, "status")
            .linked_feature("contactDetails", "Contact details", true, "phone")
            .setting("requireEmailVerification", SettingValue::Boolean(true))
            .setting("sessionTimeoutMinutes", SettingValue::Number(60.0))
    }

    /// Keeps `roles.userCount` in step with the users referencing each role.
    async fn after_seed(&self, store: &dyn Store, _created: usize) -> Result<(), SeedError> {
        refresh_reference_counts(store, Collection::Roles, Collection::Users, "roleId", "userCount")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faker::{Locale, LocaleFaker};

    #[test]
    fn test_users_reference_pool_roles() {
        let pool = UserPool {
            role_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
        };
        let mut faker = LocaleFaker::seeded(Locale::PtBr, 9);

        for _ in 0..30 {
            let user = UserGenerator.generate_fake(&pool, &mut faker).unwrap();
            assert!(pool.role_ids.contains(&user.role_id));
            assert!(UserGenerator.validate_record(&user), "{user:?}");
        }
    }

    #[test]
    fn test_empty_role_pool_fails() {
        let pool = UserPool { role_ids: vec![] };
        let mut faker = LocaleFaker::seeded(Locale::En, 9);
        assert!(matches!(
            UserGenerator.generate_fake(&pool, &mut faker),
            Err(SeedError::EmptyPool { .. })
        ));
    }

    #[test]
    fn test_status_mostly_active() {
        assert!(STATUS.share(UserStatus::Active) > 0.5);
        assert!(UserGenerator.config_defaults().validate().is_ok());
    }
}
