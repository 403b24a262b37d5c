pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

pub use commands::{CreateItemCommand, CreateItemError, DeleteItemError, UpdateItemCommand, UpdateItemError};
pub use queries::{GetItemError, ListItemsError};
pub use routes::items_routes;
pub use types::{ItemResponse, ItemsResponse};
