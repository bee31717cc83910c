//! Persistence boundary for platform collections.
//!
//! Every collection is a list of JSON documents. Each primitive call
//! (insert, patch, delete) is atomic on its own; callers that need several
//! writes get no transaction spanning them.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{Collection, Record};

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub created_at: OffsetDateTime,
    pub data: Map<String, Value>,
}

impl Document {
    /// Returns a top-level field of the document body.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Deserializes the document body into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(Value::Object(self.data.clone()))?)
    }

    /// Whether the document satisfies every equality filter of `query`.
    ///
    /// A `null` filter value also matches a missing field.
    pub fn matches(&self, query: &Query) -> bool {
        query
            .filters()
            .iter()
            .all(|(field, expected)| match self.data.get(field) {
                Some(actual) => actual == expected,
                None => expected.is_null(),
            })
    }
}

/// Equality query over one collection.
///
/// # Example
/// ```ignore
/// let pending = Query::new(Collection::Comments)
///     .eq("status", "pending")
///     .take(10);
/// let docs = store.collect(&pending).await?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    collection: Collection,
    filters: Vec<(String, Value)>,
    limit: Option<usize>,
}

impl Query {
    /// Creates a query matching every document in `collection`.
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            limit: None,
        }
    }

    /// Adds an equality filter on a top-level field.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Limits the number of returned documents. Repeated calls keep the smallest limit.
    pub fn take(mut self, n: usize) -> Self {
        self.limit = Some(self.limit.map_or(n, |limit| limit.min(n)));
        self
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn filters(&self) -> &[(String, Value)] {
        &self.filters
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

/// Durable per-call atomic operations against named collections.
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a JSON object and returns the id assigned to it.
    async fn insert(&self, collection: Collection, data: Value) -> Result<Uuid, StoreError>;

    /// Shallow-merges `partial` into an existing document.
    async fn patch(&self, collection: Collection, id: Uuid, partial: Value)
    -> Result<(), StoreError>;

    /// Deletes a single document.
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError>;

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Returns matching documents in insertion order.
    async fn collect(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, query: &Query) -> Result<usize, StoreError> {
        Ok(self.collect(query).await?.len())
    }

    async fn first(&self, query: &Query) -> Result<Option<Document>, StoreError> {
        let docs = self.collect(&query.clone().take(1)).await?;
        Ok(docs.into_iter().next())
    }

    /// Returns the only matching document, failing when more than one matches.
    async fn unique(&self, query: &Query) -> Result<Option<Document>, StoreError> {
        let mut docs = self.collect(&query.clone().take(2)).await?;
        if docs.len() > 1 {
            return Err(StoreError::NotUnique {
                collection: query.collection(),
            });
        }
        Ok(docs.pop())
    }

    /// Deletes every matching document one by one and returns how many went.
    async fn delete_where(&self, query: &Query) -> Result<usize, StoreError> {
        let docs = self.collect(query).await?;
        for doc in &docs {
            self.delete(query.collection(), doc.id).await?;
        }
        Ok(docs.len())
    }
}

/// Typed helpers over [`Store`] for [`Record`] types.
#[async_trait]
pub trait StoreExt: Store {
    async fn insert_record<T: Record>(&self, record: &T) -> Result<Uuid, StoreError> {
        let data = serde_json::to_value(record)?;
        self.insert(T::COLLECTION, data).await
    }

    /// Loads matching documents of `T`'s collection, decoded, with their ids.
    async fn records<T: Record>(&self, query: &Query) -> Result<Vec<(Uuid, T)>, StoreError> {
        debug_assert_eq!(query.collection(), T::COLLECTION);
        self.collect(query)
            .await?
            .iter()
            .map(|doc| Ok((doc.id, doc.decode::<T>()?)))
            .collect()
    }

    async fn all_records<T: Record>(&self) -> Result<Vec<(Uuid, T)>, StoreError> {
        self.records(&Query::new(T::COLLECTION)).await
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

/// Rejects anything but a JSON object as a document body.
pub(crate) fn expect_object(
    collection: Collection,
    value: Value,
) -> Result<Map<String, Value>, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument {
            collection,
            reason: format!("expected a JSON object, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(data: Value) -> Document {
        Document {
            id: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
            data: expect_object(Collection::Posts, data).unwrap(),
        }
    }

    #[test]
    fn test_document_matches_filters() {
        let post = doc(json!({"status": "draft", "viewCount": 3}));

        assert!(post.matches(&Query::new(Collection::Posts).eq("status", "draft")));
        assert!(!post.matches(&Query::new(Collection::Posts).eq("status", "published")));
        assert!(post.matches(&Query::new(Collection::Posts).eq("categoryId", Value::Null)));
    }

    #[test]
    fn test_take_keeps_smallest_limit() {
        let query = Query::new(Collection::Posts).take(10).take(3).take(5);
        assert_eq!(query.limit(), Some(3));
    }

    #[test]
    fn test_expect_object_rejects_scalars() {
        let err = expect_object(Collection::Posts, json!(42)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument { .. }));
    }
}
