//! Feature modules implementing the itemgate API
//!
//! Each feature is a vertical slice:
//! - `commands/` - Write operations (create, update, delete)
//! - `queries/` - Read operations (get, list)
//! - `routes.rs` - HTTP route definitions
//! - `types.rs` - Wire types (if needed)
//!
//! # Features
//!
//! - **items**: CRUD over the caller-owned items resource
//! - **users**: the authenticated caller

pub mod items;
pub mod shared;
pub mod users;

use axum::Router;
use std::sync::Arc;

use crate::db::ItemStore;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub items: Arc<dyn ItemStore>,
}

impl FeatureState {
    pub fn new(items: Arc<dyn ItemStore>) -> Self {
        Self { items }
    }
}

/// All `/v1` routes, relative to the configured base path
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .merge(items::items_routes())
        .merge(users::users_routes())
        .with_state(state)
}
