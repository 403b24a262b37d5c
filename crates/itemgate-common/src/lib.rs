//! Itemgate Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Pieces shared by every itemgate binary:
//!
//! - **Error Handling**: [`ItemgateError`] and the [`Result`] alias
//! - **Logging**: environment-driven `tracing` subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use itemgate_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> itemgate_common::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

pub use error::{ItemgateError, Result};
