//! Comment generation.
//!
//! Comments belong to a post and come either from a registered user or from
//! a guest who only left a name and email.

use async_trait::async_trait;
use platform::models::{Comment, CommentStatus, FieldType, SettingValue, User};
use platform::{Collection, ModuleKey, Store, StoreExt};
use serde_json::json;
use uuid::Uuid;

use super::{load_ids, refresh_reference_counts, required_id};
use crate::db::RecordGenerator;
use crate::error::SeedError;
use crate::faker::{FakeValues, WeightTable, pick};
use crate::module_config::ModuleConfigDefaults;

const STATUS: WeightTable<CommentStatus> = WeightTable::new(&[
    (CommentStatus::Approved, 70),
    (CommentStatus::Pending, 20),
    (CommentStatus::Spam, 10),
]);

const MAX_CONTENT_LEN: usize = 2000;

/// Share of comments written by registered users when any exist.
const REGISTERED_SHARE: f64 = 0.6;

pub struct CommentGenerator;

/// A registered author's identity as shown on a comment.
#[derive(Debug, Clone)]
pub struct Commenter {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

pub struct CommentPool {
    pub post_ids: Vec<Uuid>,
    /// Optional: every comment is a guest comment when empty.
    pub users: Vec<Commenter>,
}

#[async_trait]
impl RecordGenerator for CommentGenerator {
    type Record = Comment;
    type Pool = CommentPool;
    const MODULE: ModuleKey = ModuleKey::Comments;

    async fn load_pool(&self, store: &dyn Store) -> Result<CommentPool, SeedError> {
        let users = store
            .all_records::<User>()
            .await?
            .into_iter()
            .map(|(id, user)| Commenter {
                id,
                name: user.name,
                email: user.email,
            })
            .collect();

        Ok(CommentPool {
            post_ids: load_ids(store, Collection::Posts).await?,
            users,
        })
    }

    fn generate_fake(
        &self,
        pool: &CommentPool,
        faker: &mut dyn FakeValues,
    ) -> Result<Comment, SeedError> {
        let post_id = required_id(faker, &pool.post_ids, ModuleKey::Comments, ModuleKey::Posts)?;

        let registered = if faker.chance(REGISTERED_SHARE) {
            pick(faker, &pool.users).cloned()
        } else {
            None
        };
        let (author_id, author_name, author_email) = match registered {
            Some(user) => (Some(user.id), user.name, user.email),
            None => {
                let name = faker.full_name();
                let email = faker.email_for(&name);
                (None, name, email)
            }
        };

        let content = if faker.chance(0.7) {
            faker.sentence(5..20)
        } else {
            faker.paragraph(2..4)
        };

        Ok(Comment {
            post_id,
            author_id,
            author_name,
            author_email,
            content,
            status: STATUS.sample(faker),
            created_at: faker.past_datetime(180),
        })
    }

    fn validate_record(&self, comment: &Comment) -> bool {
        let content = comment.content.trim();
        !content.is_empty()
            && content.chars().count() <= MAX_CONTENT_LEN
            && !comment.author_name.trim().is_empty()
            && comment.author_email.contains('@')
    }

    fn config_defaults(&self) -> ModuleConfigDefaults {
        ModuleConfigDefaults::new(ModuleKey::Comments)
            .system_field("postId", "Post", FieldType::Reference)
            .system_field("content", "Content", FieldType::RichText)
            .system_field("authorName", "Author name", FieldType::Text)
            .field("authorEmail", "Author email", FieldType::Text)
            .field("status", "Status", FieldType::Select)
            .linked_feature("moderation", "Moderation", true, "status")
            .linked_feature("guestComments", "Guest comments", true, "authorEmail")
            .feature("threadedReplies", "Threaded replies", false)
            .setting("autoApprove", SettingValue::Boolean(false))
            .setting("maxLength", SettingValue::Number(MAX_CONTENT_LEN as f64))
            .setting(
                "blockedWords",
                SettingValue::Structured(json!(["casino", "crypto giveaway"])),
            )
    }

    /// Keeps `posts.commentCount` in step.
    async fn after_seed(&self, store: &dyn Store, _created: usize) -> Result<(), SeedError> {
        refresh_reference_counts(
            store,
            Collection::Posts,
            Collection::Comments,
            "postId",
            "commentCount",
        )
        .await
    }
}
