use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

/// The verified caller of the current request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedIdentity {
    pub id: Uuid,
    pub email: String,
}

/// Handler parameter carrying the identity attached by
/// [`require_identity`](super::middleware::require_identity)
///
/// Rejects with 401 when the route is not behind the authentication
/// middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthenticated("no authenticated identity".to_string()))
    }
}
