pub mod create;
pub mod delete;
pub mod update;

pub use create::{CreateItemCommand, CreateItemError};
pub use delete::DeleteItemError;
pub use update::{UpdateItemCommand, UpdateItemError};
