//! itemgate server library
//!
//! A small REST backend for caller-owned items. Every `/v1` request passes a
//! two-stage gate before it reaches a handler:
//!
//! 1. **Schema gate** ([`middleware::schema_gate`]): method, path, query,
//!    header and body are checked against the OpenAPI 3.1 document embedded
//!    in the binary ([`contract`]). Non-conforming requests get a single 422
//!    Problem listing every violation.
//! 2. **Identity** ([`auth`]): an RS256 bearer token is verified against the
//!    issuer's published key set and the caller's identity is attached to the
//!    request for the [`auth::CurrentUser`] extractor.
//!
//! Failures anywhere are rendered as `application/problem+json`
//! ([`api::problem`]).
//!
//! # Layout
//!
//! - [`features`]: vertical slices (`items`, `users`) with commands, queries
//!   and routes
//! - [`db`]: the [`db::ItemStore`] seam with PostgreSQL and in-memory
//!   implementations
//! - [`config`]: environment-driven configuration
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use itemgate_server::{api, auth, config::Config, contract::ApiContract, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&db::DbConfig::from(&config.database)).await?;
//!     let keys = Arc::new(auth::JwksCache::fetch(&config.token.issuer_url).await?);
//!     let state = api::AppState {
//!         items: Arc::new(db::PgItemStore::new(pool)),
//!         verifier: Arc::new(auth::TokenVerifier::new(keys, &config.token.issuer_url)),
//!         contract: Arc::new(ApiContract::embedded()?),
//!     };
//!     api::serve(api::create_router(state, &config), &config.server).await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod contract;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;

// Re-export commonly used types
pub use error::{AppError, AppResult};
