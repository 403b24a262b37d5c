use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedIdentity;
use crate::db::{DbError, ItemStore, NewItem};
use crate::error::AppError;
use crate::features::items::types::ItemResponse;
use crate::features::shared::validation::{validate_item_fields, ItemFieldError};

/// Request body of `PUT /v1/items/{id}`
///
/// Both fields are overwritten; an absent description clears it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemCommand {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateItemError {
    #[error("{0}")]
    Validation(#[from] ItemFieldError),

    #[error("Item '{0}' not found")]
    NotFound(Uuid),

    #[error("Item '{0}' already exists")]
    DuplicateTitle(String),

    #[error("Database error: {0}")]
    Database(DbError),
}

impl From<UpdateItemError> for AppError {
    fn from(err: UpdateItemError) -> Self {
        match err {
            UpdateItemError::Validation(e) => e.into(),
            UpdateItemError::NotFound(_) => AppError::NotFound(err.to_string()),
            UpdateItemError::DuplicateTitle(_) => AppError::Conflict(err.to_string()),
            UpdateItemError::Database(e) => e.into(),
        }
    }
}

impl UpdateItemCommand {
    pub fn validate(&self) -> Result<(), UpdateItemError> {
        validate_item_fields(&self.title, self.description.as_deref())?;
        Ok(())
    }
}

/// The owner is reasserted as the caller
#[tracing::instrument(skip(store, command), fields(item_id = %id, owner_id = %owner.id))]
pub async fn handle(
    store: &dyn ItemStore,
    owner: &AuthenticatedIdentity,
    id: Uuid,
    command: UpdateItemCommand,
) -> Result<ItemResponse, UpdateItemError> {
    command.validate()?;

    let title = command.title.clone();
    let record = store
        .update(
            id,
            NewItem {
                title: command.title,
                description: command.description,
                owner_id: owner.id,
            },
        )
        .await
        .map_err(|e| match e {
            DbError::NotFound(_) => UpdateItemError::NotFound(id),
            DbError::Duplicate(_) => UpdateItemError::DuplicateTitle(title),
            other => UpdateItemError::Database(other),
        })?;

    tracing::info!("Item updated");

    Ok(record.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryItemStore;

    fn caller() -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
        }
    }

    async fn seed(store: &InMemoryItemStore, title: &str, owner_id: Uuid) -> Uuid {
        store
            .create(NewItem {
                title: title.to_string(),
                description: Some("old".to_string()),
                owner_id,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_update_overwrites_and_reasserts_owner() {
        let store = InMemoryItemStore::new();
        let original_owner = Uuid::new_v4();
        let id = seed(&store, "milk", original_owner).await;
        let editor = caller();

        let updated = handle(
            &store,
            &editor,
            id,
            UpdateItemCommand {
                title: "oat milk".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.id, id);
        assert_eq!(updated.title, "oat milk");
        assert_eq!(updated.description, None);
        assert_eq!(updated.owner_id, editor.id);
    }

    #[tokio::test]
    async fn test_update_missing_item_is_not_found() {
        let store = InMemoryItemStore::new();
        let id = Uuid::new_v4();

        let err = handle(
            &store,
            &caller(),
            id,
            UpdateItemCommand {
                title: "milk".to_string(),
                description: None,
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), format!("Item '{}' not found", id));
        assert!(matches!(AppError::from(err), AppError::NotFound(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_to_taken_title_is_conflict() {
        let store = InMemoryItemStore::new();
        let editor = caller();
        seed(&store, "milk", editor.id).await;
        let id = seed(&store, "bread", editor.id).await;

        let err = handle(
            &store,
            &editor,
            id,
            UpdateItemCommand {
                title: "milk".to_string(),
                description: None,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, UpdateItemError::DuplicateTitle(_)));
        assert_eq!(store.find(id).await.unwrap().title, "bread");
    }
}
