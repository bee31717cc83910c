//! PostgreSQL document store.
//!
//! All collections share one `documents` table with a JSONB body. Filters are
//! compiled to `data -> field = value` comparisons.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::database::{Document, Query, Store, expect_object};
use crate::errors::StoreError;
use crate::models::Collection;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with a small pool, suitable for seeding scripts.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded document-table migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        info!("Running document store migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Returns a reference to the pool for advanced usage.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Appends `WHERE collection = .. AND data -> field = ..` for `query`.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &Query) {
    builder
        .push(" WHERE collection = ")
        .push_bind(query.collection().as_str());

    for (field, value) in query.filters() {
        if value.is_null() {
            builder
                .push(" AND (data -> ")
                .push_bind(field.clone())
                .push(" IS NULL OR data -> ")
                .push_bind(field.clone())
                .push(" = 'null'::jsonb)");
        } else {
            builder
                .push(" AND data -> ")
                .push_bind(field.clone())
                .push(" = ")
                .push_bind(Json(value.clone()));
        }
    }
}

fn limit_as_i64(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl Store for PgStore {
    async fn insert(&self, collection: Collection, data: Value) -> Result<Uuid, StoreError> {
        let data = expect_object(collection, data)?;
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO documents (id, collection, data, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(collection.as_str())
        .bind(Json(Value::Object(data)))
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn patch(
        &self,
        collection: Collection,
        id: Uuid,
        partial: Value,
    ) -> Result<(), StoreError> {
        let partial = expect_object(collection, partial)?;

        let result = sqlx::query(
            r#"
            UPDATE documents SET data = data || $1
            WHERE collection = $2 AND id = $3
            "#,
        )
        .bind(Json(Value::Object(partial)))
        .bind(collection.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { collection, id });
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { collection, id });
        }
        Ok(())
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, data, created_at FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row_to_document(collection, &row)).transpose()
    }

    async fn collect(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut builder = QueryBuilder::new("SELECT id, data, created_at FROM documents");
        push_filters(&mut builder, query);
        builder.push(" ORDER BY seq");
        if let Some(limit) = query.limit() {
            builder.push(" LIMIT ").push_bind(limit_as_i64(limit));
        }

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row_to_document(query.collection(), row))
            .collect()
    }

    async fn count(&self, query: &Query) -> Result<usize, StoreError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM documents");
        push_filters(&mut builder, query);

        let row = builder.build().fetch_one(&self.pool).await?;
        let count: i64 = row.try_get(0)?;
        let count = usize::try_from(count).unwrap_or(0);

        Ok(query.limit().map_or(count, |limit| count.min(limit)))
    }

    async fn delete_where(&self, query: &Query) -> Result<usize, StoreError> {
        let mut builder =
            QueryBuilder::new("DELETE FROM documents WHERE seq IN (SELECT seq FROM documents");
        push_filters(&mut builder, query);
        if let Some(limit) = query.limit() {
            builder.push(" ORDER BY seq LIMIT ").push_bind(limit_as_i64(limit));
        }
        builder.push(")");

        let result = builder.build().execute(&self.pool).await?;
        Ok(usize::try_from(result.rows_affected()).unwrap_or(usize::MAX))
    }
}

fn row_to_document(
    collection: Collection,
    row: &sqlx::postgres::PgRow,
) -> Result<Document, StoreError> {
    let id: Uuid = row.try_get("id")?;
    let Json(data): Json<Value> = row.try_get("data")?;
    let created_at: OffsetDateTime = row.try_get("created_at")?;

    Ok(Document {
        id,
        created_at,
        data: expect_object(collection, data)?,
    })
}
