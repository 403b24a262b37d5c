use uuid::Uuid;

use crate::db::{DbError, ItemStore};
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum DeleteItemError {
    #[error("Item '{0}' not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(DbError),
}

impl From<DeleteItemError> for AppError {
    fn from(err: DeleteItemError) -> Self {
        match err {
            DeleteItemError::NotFound(_) => AppError::NotFound(err.to_string()),
            DeleteItemError::Database(e) => e.into(),
        }
    }
}

/// Ownership is not checked
#[tracing::instrument(skip(store))]
pub async fn handle(store: &dyn ItemStore, id: Uuid) -> Result<(), DeleteItemError> {
    store.delete(id).await.map_err(|e| match e {
        DbError::NotFound(_) => DeleteItemError::NotFound(id),
        other => DeleteItemError::Database(other),
    })?;

    tracing::info!(item_id = %id, "Item deleted");

    Ok(())
}
