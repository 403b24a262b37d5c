use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::ItemRecord;

/// Wire form of an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: Uuid,
    pub title: String,
    /// Serialized as `null` when absent
    pub description: Option<String>,
    pub owner_id: Uuid,
}

impl From<ItemRecord> for ItemResponse {
    fn from(record: ItemRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            owner_id: record.owner_id,
        }
    }
}

/// One page of items; `count` is the length of `data`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsResponse {
    pub data: Vec<ItemResponse>,
    pub count: usize,
}

impl ItemsResponse {
    pub fn new(data: Vec<ItemResponse>) -> Self {
        Self {
            count: data.len(),
            data,
        }
    }
}
