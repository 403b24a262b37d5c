//! Extractors whose rejections render as validation problems
//!
//! Axum's stock `Json`, `Path` and `Query` reject with plain-text bodies.
//! These wrappers route the rejection through [`AppError`] instead, so a
//! malformed request that slips past the schema gate still gets a 422
//! Problem.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
