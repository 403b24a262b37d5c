//! Item persistence
//!
//! [`ItemStore`] is the seam between the item handlers and storage.
//! [`PgItemStore`] is the production implementation; [`InMemoryItemStore`]
//! has the same observable behaviour (including `(owner_id, title)`
//! uniqueness and insertion ordering) and backs tests and local runs.

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DbError, DbResult};

const RESOURCE: &str = "Item";

/// A stored item row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ItemRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
}

/// Values written on create and update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
}

#[async_trait]
pub trait ItemStore: Send + Sync + 'static {
    /// Items in insertion order, skipping `offset` and returning at most `limit`
    async fn list(&self, offset: i64, limit: i64) -> DbResult<Vec<ItemRecord>>;

    /// Fails with [`DbError::Duplicate`] when the owner already has an item with this title
    async fn create(&self, item: NewItem) -> DbResult<ItemRecord>;

    async fn find(&self, id: Uuid) -> DbResult<ItemRecord>;

    /// Overwrites every column except `id`
    async fn update(&self, id: Uuid, item: NewItem) -> DbResult<ItemRecord>;

    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

// ============================================================================
// PostgreSQL
// ============================================================================

#[derive(Debug, Clone)]
pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn list(&self, offset: i64, limit: i64) -> DbResult<Vec<ItemRecord>> {
        let items = sqlx::query_as::<_, ItemRecord>(
            r#"
            SELECT id, title, description, owner_id
            FROM items
            ORDER BY seq
            OFFSET $1
            LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn create(&self, item: NewItem) -> DbResult<ItemRecord> {
        sqlx::query_as::<_, ItemRecord>(
            r#"
            INSERT INTO items (title, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, owner_id
            "#,
        )
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_write(e, RESOURCE, &item.title))
    }

    async fn find(&self, id: Uuid) -> DbResult<ItemRecord> {
        sqlx::query_as::<_, ItemRecord>(
            r#"
            SELECT id, title, description, owner_id
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(RESOURCE, &id.to_string()))
    }

    async fn update(&self, id: Uuid, item: NewItem) -> DbResult<ItemRecord> {
        sqlx::query_as::<_, ItemRecord>(
            r#"
            UPDATE items
            SET title = $2, description = $3, owner_id = $4
            WHERE id = $1
            RETURNING id, title, description, owner_id
            "#,
        )
        .bind(id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DbError::from_write(e, RESOURCE, &item.title))?
        .ok_or_else(|| DbError::not_found(RESOURCE, &id.to_string()))
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(RESOURCE, &id.to_string()));
        }

        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Vector-backed store; insertion order is the vector order
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    items: RwLock<Vec<ItemRecord>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

fn title_taken(items: &[ItemRecord], item: &NewItem, except: Option<Uuid>) -> bool {
    items.iter().any(|existing| {
        Some(existing.id) != except
            && existing.owner_id == item.owner_id
            && existing.title == item.title
    })
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn list(&self, offset: i64, limit: i64) -> DbResult<Vec<ItemRecord>> {
        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let items = self.items.read().await;
        Ok(items.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn create(&self, item: NewItem) -> DbResult<ItemRecord> {
        let mut items = self.items.write().await;
        if title_taken(&items, &item, None) {
            return Err(DbError::duplicate(RESOURCE, &item.title));
        }

        let record = ItemRecord {
            id: Uuid::new_v4(),
            title: item.title,
            description: item.description,
            owner_id: item.owner_id,
        };
        items.push(record.clone());
        Ok(record)
    }

    async fn find(&self, id: Uuid) -> DbResult<ItemRecord> {
        self.items
            .read()
            .await
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| DbError::not_found(RESOURCE, &id.to_string()))
    }

    async fn update(&self, id: Uuid, item: NewItem) -> DbResult<ItemRecord> {
        let mut items = self.items.write().await;
        let Some(index) = items.iter().position(|existing| existing.id == id) else {
            return Err(DbError::not_found(RESOURCE, &id.to_string()));
        };
        if title_taken(&items, &item, Some(id)) {
            return Err(DbError::duplicate(RESOURCE, &item.title));
        }

        let record = &mut items[index];
        record.title = item.title;
        record.description = item.description;
        record.owner_id = item.owner_id;
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Err(DbError::not_found(RESOURCE, &id.to_string()));
        }
        Ok(())
    }
}
