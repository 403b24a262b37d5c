//! Shared utilities and types for feature modules
//!
//! - **pagination**: `skip`/`limit` parameters for list queries
//! - **extract**: extractors that reject with Problem bodies
//! - **validation**: field checks shared by item commands

pub mod extract;
pub mod pagination;
pub mod validation;

pub use extract::{AppJson, AppPath, AppQuery};
pub use pagination::PaginationParams;
pub use validation::validate_item_fields;
