//! User API routes
//!
//! - `GET /v1/users/me` - The authenticated caller

use axum::{routing::get, Json, Router};

use super::queries::{self, UserMeResponse};
use crate::auth::CurrentUser;
use crate::features::FeatureState;

pub fn users_routes() -> Router<FeatureState> {
    Router::new().route("/v1/users/me", get(me))
}

/// Rejects with 401 through [`CurrentUser`] when no identity is attached
#[tracing::instrument(skip(user), fields(user_id = %user.0.id))]
async fn me(user: CurrentUser) -> Json<UserMeResponse> {
    Json(queries::me::handle(&user.0))
}
