//! Blog post generation.

use async_trait::async_trait;
use platform::models::{FieldType, Post, PostStatus, SettingValue};
use platform::{Collection, ModuleKey, Store};
use uuid::Uuid;

use super::{load_ids, refresh_reference_counts, required_id};
use crate::db::RecordGenerator;
use crate::error::SeedError;
use crate::faker::{FakeValues, WeightTable, pick, slugify};
use crate::module_config::ModuleConfigDefaults;

const STATUS: WeightTable<PostStatus> = WeightTable::new(&[
    (PostStatus::Published, 60),
    (PostStatus::Draft, 30),
    (PostStatus::Archived, 10),
]);

const MAX_TITLE_LEN: usize = 200;

pub struct PostGenerator;

pub struct PostPool {
    pub author_ids: Vec<Uuid>,
    /// Optional: posts stay uncategorised when empty.
    pub category_ids: Vec<Uuid>,
}

#[async_trait]
impl RecordGenerator for PostGenerator {
    type Record = Post;
    type Pool = PostPool;
    const MODULE: ModuleKey = ModuleKey::Posts;

    async fn load_pool(&self, store: &dyn Store) -> Result<PostPool, SeedError> {
        Ok(PostPool {
            author_ids: load_ids(store, Collection::Users).await?,
            category_ids: load_ids(store, Collection::Categories).await?,
        })
    }

    fn generate_fake(&self, pool: &PostPool, faker: &mut dyn FakeValues) -> Result<Post, SeedError> {
        let author_id = required_id(faker, &pool.author_ids, ModuleKey::Posts, ModuleKey::Users)?;
        let category_id = if faker.chance(0.9) {
            pick(faker, &pool.category_ids).copied()
        } else {
            None
        };

        let title = faker.sentence(4..9).trim_end_matches('.').to_string();
        let paragraphs = faker.int_in(3..=6);
        let body = (0..paragraphs)
            .map(|_| faker.paragraph(3..7))
            .collect::<Vec<_>>()
            .join("\n\n");

        let status = STATUS.sample(faker);
        let published = status == PostStatus::Published;

        Ok(Post {
            slug: slugify(&title),
            excerpt: faker.sentence(12..24),
            body,
            author_id,
            category_id,
            status,
            tags: faker.words(1..5),
            view_count: if published {
                u32::try_from(faker.poisson(150.0)).unwrap_or(u32::MAX)
            } else {
                0
            },
            comment_count: 0,
            published_at: published.then(|| faker.past_datetime(365)),
            title,
        })
    }

    fn validate_record(&self, post: &Post) -> bool {
        let title = post.title.trim();
        !title.is_empty()
            && title.chars().count() <= MAX_TITLE_LEN
            && !post.body.trim().is_empty()
            && (post.status == PostStatus::Published) == post.published_at.is_some()
    }

    fn config_defaults(&self) -> ModuleConfigDefaults {
        ModuleConfigDefaults::new(ModuleKey::Posts)
            .system_field("title", "Title", FieldType::Text)
            .system_field("slug", "Slug", FieldType::Text)
            .field("excerpt", "Excerpt", FieldType::Text)
            .system_field("body", "Body", FieldType::RichText)
            .system_field("authorId", "Author", FieldType::Reference)
            .field("categoryId", "Category", FieldType::Reference)
            .field("status", "Status", FieldType::Select)
            .field("tags", "Tags", FieldType::Select)
            .field("publishedAt", "Published at", FieldType::Date)
            .linked_feature("categories", "Categories", true, "categoryId")
            .linked_feature("tagging", "Tags", true, "tags")
            .linked_feature("scheduling", "Scheduled publishing", false, "publishedAt")
            .setting("postsPerPage", SettingValue::Number(10.0))
            .setting("defaultStatus", SettingValue::Text("draft".to_string()))
    }

    /// Keeps `categories.postCount` in step.
    async fn after_seed(&self, store: &dyn Store, _created: usize) -> Result<(), SeedError> {
        refresh_reference_counts(
            store,
            Collection::Categories,
            Collection::Posts,
            "categoryId",
            "postCount",
        )
        .await
    }
}
