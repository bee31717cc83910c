//! In-process document store used by tests and preview environments.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::{Document, Query, Store, expect_object};
use crate::errors::StoreError;
use crate::models::Collection;

/// [`Store`] backed by per-collection vectors behind a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, collection: Collection, data: Value) -> Result<Uuid, StoreError> {
        let data = expect_object(collection, data)?;
        let id = Uuid::new_v4();

        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(Document {
                id,
                created_at: OffsetDateTime::now_utc(),
                data,
            });

        Ok(id)
    }

    async fn patch(
        &self,
        collection: Collection,
        id: Uuid,
        partial: Value,
    ) -> Result<(), StoreError> {
        let partial = expect_object(collection, partial)?;
        let mut collections = self.collections.write().await;

        let doc = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or(StoreError::NotFound { collection, id })?;

        doc.data.extend(partial);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections
            .get_mut(&collection)
            .ok_or(StoreError::NotFound { collection, id })?;

        let position = docs
            .iter()
            .position(|doc| doc.id == id)
            .ok_or(StoreError::NotFound { collection, id })?;
        docs.remove(position);
        Ok(())
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn collect(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&query.collection()) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .iter()
            .filter(|doc| doc.matches(query))
            .take(query.limit().unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count(&self, query: &Query) -> Result<usize, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&query.collection()).map_or(0, |docs| {
            docs.iter()
                .filter(|doc| doc.matches(query))
                .take(query.limit().unwrap_or(usize::MAX))
                .count()
        }))
    }

    async fn delete_where(&self, query: &Query) -> Result<usize, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&query.collection()) else {
            return Ok(0);
        };

        let limit = query.limit().unwrap_or(usize::MAX);
        let before = docs.len();
        let mut removed = 0;
        docs.retain(|doc| {
            if removed < limit && doc.matches(query) {
                removed += 1;
                false
            } else {
                true
            }
        });

        Ok(before - docs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::StoreExt;
    use crate::models::{Category, Comment, CommentStatus};
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::new();
        let id = store
            .insert(Collection::Categories, json!({"name": "News"}))
            .await
            .unwrap();

        let doc = store.get(Collection::Categories, id).await.unwrap().unwrap();
        assert_eq!(doc.field("name"), Some(&json!("News")));
        assert!(store.get(Collection::Posts, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_patch_merges_fields() {
        let store = MemoryStore::new();
        let id = store
            .insert(Collection::Categories, json!({"name": "News", "postCount": 0}))
            .await
            .unwrap();

        store
            .patch(Collection::Categories, id, json!({"postCount": 4}))
            .await
            .unwrap();

        let doc = store.get(Collection::Categories, id).await.unwrap().unwrap();
        assert_eq!(doc.field("name"), Some(&json!("News")));
        assert_eq!(doc.field("postCount"), Some(&json!(4)));
    }

    #[tokio::test]
    async fn test_patch_and_delete_missing_document() {
        let store = MemoryStore::new();
        let missing = Uuid::new_v4();

        let err = store
            .patch(Collection::Users, missing, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        let err = store.delete(Collection::Users, missing).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_query_take_first_unique() {
        let store = MemoryStore::new();
        for status in ["approved", "approved", "spam"] {
            store
                .insert(Collection::Comments, json!({"status": status}))
                .await
                .unwrap();
        }

        let approved = Query::new(Collection::Comments).eq("status", "approved");
        assert_eq!(store.count(&approved).await.unwrap(), 2);
        assert_eq!(store.collect(&approved.clone().take(1)).await.unwrap().len(), 1);
        assert!(store.first(&approved).await.unwrap().is_some());

        let err = store.unique(&approved).await.unwrap_err();
        assert!(matches!(err, StoreError::NotUnique { .. }));

        let spam = Query::new(Collection::Comments).eq("status", "spam");
        assert!(store.unique(&spam).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_where_only_touches_matches() {
        let store = MemoryStore::new();
        for status in ["approved", "pending", "pending"] {
            store
                .insert(Collection::Comments, json!({"status": status}))
                .await
                .unwrap();
        }

        let deleted = store
            .delete_where(&Query::new(Collection::Comments).eq("status", "pending"))
            .await
            .unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(
            store.count(&Query::new(Collection::Comments)).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_typed_records() {
        let store = MemoryStore::new();
        let category = Category {
            name: "Guides".to_string(),
            slug: "guides".to_string(),
            description: None,
            post_count: 0,
            product_count: 0,
        };
        let category_id = store.insert_record(&category).await.unwrap();

        let comment = Comment {
            post_id: Uuid::new_v4(),
            author_id: None,
            author_name: "Guest".to_string(),
            author_email: "guest@example.com".to_string(),
            content: "Nice write-up".to_string(),
            status: CommentStatus::Pending,
            created_at: OffsetDateTime::now_utc(),
        };
        store.insert_record(&comment).await.unwrap();

        let categories = store.all_records::<Category>().await.unwrap();
        assert_eq!(categories, vec![(category_id, category)]);

        let comments = store.all_records::<Comment>().await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].1.status, CommentStatus::Pending);
    }
}
