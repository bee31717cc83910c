//! Notification generation.

use async_trait::async_trait;
use platform::models::{FieldType, Notification, NotificationKind, SettingValue};
use platform::{Collection, ModuleKey, Store};
use uuid::Uuid;

use super::{load_ids, required_id};
use crate::db::RecordGenerator;
use crate::error::SeedError;
use crate::faker::{FakeValues, WeightTable};
use crate::module_config::ModuleConfigDefaults;

const KIND: WeightTable<NotificationKind> = WeightTable::new(&[
    (NotificationKind::Info, 50),
    (NotificationKind::Success, 25),
    (NotificationKind::Warning, 15),
    (NotificationKind::Error, 10),
]);

fn titles(kind: NotificationKind) -> &'static [&'static str] {
    match kind {
        NotificationKind::Info => &["New comment on your post", "Weekly digest", "Profile viewed"],
        NotificationKind::Success => &["Order shipped", "Post published", "Payment received"],
        NotificationKind::Warning => &["Low stock", "Password expires soon", "Storage almost full"],
        NotificationKind::Error => &["Payment failed", "Import failed", "Sync error"],
    }
}

pub struct NotificationGenerator;

pub struct NotificationPool {
    pub user_ids: Vec<Uuid>,
}

#[async_trait]
impl RecordGenerator for NotificationGenerator {
    type Record = Notification;
    type Pool = NotificationPool;
    const MODULE: ModuleKey = ModuleKey::Notifications;

    async fn load_pool(&self, store: &dyn Store) -> Result<NotificationPool, SeedError> {
        Ok(NotificationPool {
            user_ids: load_ids(store, Collection::Users).await?,
        })
    }

    fn generate_fake(
        &self,
        pool: &NotificationPool,
        faker: &mut dyn FakeValues,
    ) -> Result<Notification, SeedError> {
        let user_id = required_id(
            faker,
            &pool.user_ids,
            ModuleKey::Notifications,
            ModuleKey::Users,
        )?;
        let kind = KIND.sample(faker);
        let options = titles(kind);

        Ok(Notification {
            user_id,
            kind,
            title: options[faker.index(options.len())].to_string(),
            message: faker.sentence(6..16),
            read: faker.chance(0.4),
            created_at: faker.past_datetime(60),
        })
    }

    fn validate_record(&self, notification: &Notification) -> bool {
        !notification.title.trim().is_empty() && !notification.message.trim().is_empty()
    }

    fn config_defaults(&self) -> ModuleConfigDefaults {
        ModuleConfigDefaults::new(ModuleKey::Notifications)
            .system_field("userId", "Recipient", FieldType::Reference)
            .system_field("kind", "Kind", FieldType::Select)
            .system_field("title", "Title", FieldType::Text)
            .field("message", "Message", FieldType::Text)
            .field("read", "Read", FieldType::Boolean)
            .linked_feature("readReceipts", "Read receipts", true, "read")
            .feature("emailDelivery", "Email delivery", false)
            .setting("retentionDays", SettingValue::Number(90.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faker::{Locale, LocaleFaker};

    #[test]
    fn test_titles_match_kind() {
        let pool = NotificationPool {
            user_ids: vec![Uuid::new_v4()],
        };
        let mut faker = LocaleFaker::seeded(Locale::En, 13);

        for _ in 0..40 {
            let notification = NotificationGenerator.generate_fake(&pool, &mut faker).unwrap();
            assert!(titles(notification.kind).contains(&notification.title.as_str()));
            assert!(NotificationGenerator.validate_record(&notification));
        }
    }

    #[test]
    fn test_every_kind_has_titles() {
        for kind in KIND.values() {
            assert!(!titles(kind).is_empty());
        }
    }
}
