//! Create item command
//!
//! The caller becomes the owner. A second item with the same title for the
//! same owner is a conflict and nothing is inserted.

use serde::{Deserialize, Serialize};

use crate::auth::AuthenticatedIdentity;
use crate::db::{DbError, ItemStore, NewItem};
use crate::error::AppError;
use crate::features::items::types::ItemResponse;
use crate::features::shared::validation::{validate_item_fields, ItemFieldError};

/// Request body of `POST /v1/items`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemCommand {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateItemError {
    #[error("{0}")]
    Validation(#[from] ItemFieldError),

    #[error("Item '{0}' already exists")]
    DuplicateTitle(String),

    #[error("Database error: {0}")]
    Database(DbError),
}

impl From<CreateItemError> for AppError {
    fn from(err: CreateItemError) -> Self {
        match err {
            CreateItemError::Validation(e) => e.into(),
            CreateItemError::DuplicateTitle(_) => AppError::Conflict(err.to_string()),
            CreateItemError::Database(e) => e.into(),
        }
    }
}

impl CreateItemCommand {
    pub fn validate(&self) -> Result<(), CreateItemError> {
        validate_item_fields(&self.title, self.description.as_deref())?;
        Ok(())
    }
}

#[tracing::instrument(skip(store, command), fields(title = %command.title, owner_id = %owner.id))]
pub async fn handle(
    store: &dyn ItemStore,
    owner: &AuthenticatedIdentity,
    command: CreateItemCommand,
) -> Result<ItemResponse, CreateItemError> {
    command.validate()?;

    let title = command.title.clone();
    let record = store
        .create(NewItem {
            title: command.title,
            description: command.description,
            owner_id: owner.id,
        })
        .await
        .map_err(|e| match e {
            DbError::Duplicate(_) => CreateItemError::DuplicateTitle(title),
            other => CreateItemError::Database(other),
        })?;

    tracing::info!(item_id = %record.id, "Item created");

    Ok(record.into())
}
