//! Offset pagination for list queries
//!
//! ```rust,ignore
//! use itemgate_server::features::shared::PaginationParams;
//!
//! let params = PaginationParams::new(Some(20), Some(10));
//! assert_eq!(params.offset(), 20);
//! assert_eq!(params.limit(), 10);
//! ```

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 100;

/// `?skip=&limit=` query parameters
///
/// Out-of-range values are rejected by the schema gate before a handler
/// runs; the accessors still clamp so direct callers get the same bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub fn new(skip: Option<i64>, limit: Option<i64>) -> Self {
        Self { skip, limit }
    }

    /// Rows to skip, defaulting to 0
    pub fn offset(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    /// Page size, defaulting to 100 and clamped to 1-100
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}
