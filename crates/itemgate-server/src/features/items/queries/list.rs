use crate::db::{DbError, ItemStore};
use crate::error::AppError;
use crate::features::items::types::{ItemResponse, ItemsResponse};
use crate::features::shared::PaginationParams;

#[derive(Debug, thiserror::Error)]
pub enum ListItemsError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl From<ListItemsError> for AppError {
    fn from(err: ListItemsError) -> Self {
        match err {
            ListItemsError::Database(e) => e.into(),
        }
    }
}

/// Items of every owner, in insertion order
#[tracing::instrument(skip(store))]
pub async fn handle(
    store: &dyn ItemStore,
    params: PaginationParams,
) -> Result<ItemsResponse, ListItemsError> {
    let records = store.list(params.offset(), params.limit()).await?;

    Ok(ItemsResponse::new(
        records.into_iter().map(ItemResponse::from).collect(),
    ))
}
