//! Request conformance against the interface contract

use axum::{
    body::{to_bytes, Body},
    extract::{Query, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::api::problem::Violation;
use crate::contract::ApiContract;
use crate::error::AppError;

/// Largest request body the gate will buffer
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Validate method, parameters and body of every request whose path is
/// declared in the contract. Undeclared paths pass through untouched.
pub async fn schema_gate(
    State(contract): State<Arc<ApiContract>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some((route, path_params)) = contract.match_route(req.uri().path()) else {
        return Ok(next.run(req).await);
    };

    let Some(operation) = route.operation(req.method()) else {
        let allowed: Vec<_> = route.methods().map(|m| m.as_str()).collect();
        return Err(AppError::validation(
            "method",
            format!(
                "{} is not declared for {}; expected one of {}",
                req.method(),
                route.template(),
                allowed.join(", ")
            ),
        ));
    };

    let query = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
        .map(|Query(pairs)| pairs)
        .unwrap_or_default();
    let mut violations = operation.check_parameters(&path_params, &query, req.headers());

    let req = match operation.body() {
        Some(body_spec) => {
            let (parts, body) = req.into_parts();
            let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
                Ok(bytes) => bytes,
                Err(_) => {
                    violations.push(Violation::new(
                        "body",
                        format!("request body exceeds {} bytes", MAX_BODY_BYTES),
                    ));
                    return Err(AppError::Validation(violations));
                },
            };
            violations.extend(body_spec.check(parts.headers.get(header::CONTENT_TYPE), &bytes));
            Request::from_parts(parts, Body::from(bytes))
        },
        None => req,
    };

    if !violations.is_empty() {
        tracing::debug!(
            operation = operation.operation_id().unwrap_or(route.template()),
            violations = violations.len(),
            "Request does not conform to contract"
        );
        return Err(AppError::Validation(violations));
    }

    Ok(next.run(req).await)
}
