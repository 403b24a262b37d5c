use uuid::Uuid;

use crate::db::{DbError, ItemStore};
use crate::error::AppError;
use crate::features::items::types::ItemResponse;

#[derive(Debug, thiserror::Error)]
pub enum GetItemError {
    #[error("Item '{0}' not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(DbError),
}

impl From<GetItemError> for AppError {
    fn from(err: GetItemError) -> Self {
        match err {
            GetItemError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetItemError::Database(e) => e.into(),
        }
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(store: &dyn ItemStore, id: Uuid) -> Result<ItemResponse, GetItemError> {
    let record = store.find(id).await.map_err(|e| match e {
        DbError::NotFound(_) => GetItemError::NotFound(id),
        other => GetItemError::Database(other),
    })?;

    Ok(record.into())
}
