//! Server-specific error types
//!
//! [`AppError`] is the single failure type returned by handlers and
//! middleware. It classifies every failure into the problem taxonomy and
//! renders it as a [`Problem`].

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::problem::{Problem, Violation};
use crate::auth::AuthError;
use crate::db::DbError;

/// Result type alias for handler operations
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed with {} violation(s)", .0.len())]
    Validation(Vec<Violation>),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![Violation::new(field, message)])
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_problem(&self) -> Problem {
        let status = self.status_code();
        let reason = status.canonical_reason().unwrap_or("Unknown");
        match self {
            AppError::Unauthenticated(_) | AppError::Forbidden(_) => Problem::new(status, reason),
            AppError::NotFound(message) | AppError::Conflict(message) => {
                Problem::new(status, message.clone())
            },
            AppError::Validation(violations) => {
                Problem::new(status, reason).with_violations(violations.clone())
            },
            AppError::Internal(_) => Problem::new(status, "An unexpected error occurred"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
            },
            AppError::Unauthenticated(ref reason) | AppError::Forbidden(ref reason) => {
                tracing::debug!(status = %self.status_code(), reason = %reason, "Request rejected");
            },
            AppError::Validation(ref violations) => {
                tracing::debug!(violations = violations.len(), "Request failed validation");
            },
            _ => {},
        }

        self.to_problem().into_response()
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(message) => AppError::NotFound(message),
            DbError::Duplicate(message) => AppError::Conflict(message),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        if err.is_unauthenticated() {
            AppError::Unauthenticated(err.to_string())
        } else {
            AppError::Forbidden(err.to_string())
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation("body", rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::validation("path", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::validation("query", rejection.body_text())
    }
}
