use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::TokenVerifier;
use crate::error::AppError;

/// Reject requests without a verifiable bearer token; otherwise attach the
/// caller's [`AuthenticatedIdentity`](super::AuthenticatedIdentity)
pub async fn require_identity(
    State(verifier): State<Arc<TokenVerifier>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = verifier
        .verify_header(req.headers().get(header::AUTHORIZATION))
        .await?;

    tracing::debug!(user_id = %identity.id, "Authenticated request");

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{test_support::*, CurrentUser};
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|CurrentUser(user): CurrentUser| async move { user.id.to_string() }),
            )
            .route_layer(middleware::from_fn_with_state(
                Arc::new(verifier()),
                require_identity,
            ))
    }

    #[tokio::test]
    async fn test_no_header_is_401() {
        let response = app()
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_token_is_403() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_identity_reaches_handler() {
        let sub = Uuid::new_v4();
        let token = sign(&claims(&sub.to_string()), Some(KID), SIGNING_KEY);

        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(std::str::from_utf8(&body).unwrap(), sub.to_string());
    }
}
