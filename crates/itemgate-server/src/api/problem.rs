//! `application/problem+json` bodies
//!
//! Every failure leaving the service is rendered as a [`Problem`]. Error
//! responses are produced deep inside the stack, where the request URI may
//! already have been rewritten by nesting, so [`AppError`](crate::error::AppError)
//! leaves `instance` empty and [`render_problems`] fills it in from the
//! original URI on the way out.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

pub const PROBLEM_JSON: &str = "application/problem+json";

/// A single failed check inside a validation problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Where the failure was found: `method`, `query.limit`, `path.id`,
    /// `header.x-request-id`, `body` or `body/title`
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Uniform error body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub status: u16,
    pub title: String,
    pub detail: String,
    pub instance: String,
    /// Always `null`
    #[serde(rename = "type")]
    pub problem_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub violations: Option<Vec<Violation>>,
}

impl Problem {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Unknown").to_string(),
            detail: detail.into(),
            instance: String::new(),
            problem_type: None,
            violations: None,
        }
    }

    pub fn with_violations(mut self, violations: Vec<Violation>) -> Self {
        self.violations = Some(violations);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match serde_json::to_vec(&self) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize problem body");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            },
        };

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON));
        response.extensions_mut().insert(self);
        response
    }
}

/// Stamp `instance` on every problem response with the request's path and query
pub async fn render_problems(req: Request, next: Next) -> Response {
    let instance = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let mut response = next.run(req).await;

    let problem = match response.extensions_mut().remove::<Problem>() {
        Some(problem) => problem,
        // Bodiless errors from the router or tower layers (405, 408)
        None if is_bare_error(&response) => {
            let status = response.status();
            Problem::new(status, status.canonical_reason().unwrap_or("Unknown"))
        },
        None => return response,
    };

    let mut rendered = Problem { instance, ..problem }.into_response();
    for (name, value) in response.headers() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }
    rendered
}

fn is_bare_error(response: &Response) -> bool {
    let status = response.status();
    (status.is_client_error() || status.is_server_error())
        && !response.headers().contains_key(header::CONTENT_TYPE)
}
