//! Item API routes
//!
//! - `GET /v1/items?skip=&limit=` - List items in insertion order
//! - `POST /v1/items` - Create an item owned by the caller
//! - `GET /v1/items/:id` - Read one item
//! - `PUT /v1/items/:id` - Replace title and description
//! - `DELETE /v1/items/:id` - Delete an item
//!
//! Every route sits behind the identity middleware; only create and update
//! consult the caller.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::{
    commands::{self, CreateItemCommand, UpdateItemCommand},
    queries,
};
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::features::shared::{AppJson, AppPath, AppQuery, PaginationParams};
use crate::features::FeatureState;

pub fn items_routes() -> Router<FeatureState> {
    Router::new()
        .route("/v1/items", get(list_items).post(create_item))
        .route(
            "/v1/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

#[tracing::instrument(skip(state, user, command), fields(owner_id = %user.0.id))]
async fn create_item(
    State(state): State<FeatureState>,
    user: CurrentUser,
    AppJson(command): AppJson<CreateItemCommand>,
) -> Result<Response, AppError> {
    let CurrentUser(owner) = user;
    let item = commands::create::handle(state.items.as_ref(), &owner, command).await?;

    Ok((StatusCode::OK, Json(item)).into_response())
}

#[tracing::instrument(skip(state, user, command), fields(item_id = %id))]
async fn update_item(
    State(state): State<FeatureState>,
    user: CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(command): AppJson<UpdateItemCommand>,
) -> Result<Response, AppError> {
    let CurrentUser(owner) = user;
    let item = commands::update::handle(state.items.as_ref(), &owner, id, command).await?;

    Ok((StatusCode::OK, Json(item)).into_response())
}

#[tracing::instrument(skip(state), fields(item_id = %id))]
async fn delete_item(
    State(state): State<FeatureState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Response, AppError> {
    commands::delete::handle(state.items.as_ref(), id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

#[tracing::instrument(skip(state), fields(item_id = %id))]
async fn get_item(
    State(state): State<FeatureState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Response, AppError> {
    let item = queries::get::handle(state.items.as_ref(), id).await?;

    Ok((StatusCode::OK, Json(item)).into_response())
}

#[tracing::instrument(skip(state))]
async fn list_items(
    State(state): State<FeatureState>,
    AppQuery(params): AppQuery<PaginationParams>,
) -> Result<Response, AppError> {
    let page = queries::list::handle(state.items.as_ref(), params).await?;

    tracing::debug!(count = page.count, "Items listed");

    Ok((StatusCode::OK, Json(page)).into_response())
}
