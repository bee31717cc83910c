use thiserror::Error;
use uuid::Uuid;

use crate::models::Collection;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document {id} not found in {collection}")]
    NotFound { collection: Collection, id: Uuid },

    #[error("Query on {collection} matched more than one document")]
    NotUnique { collection: Collection },

    #[error("Invalid document for {collection}: {reason}")]
    InvalidDocument {
        collection: Collection,
        reason: String,
    },
}
