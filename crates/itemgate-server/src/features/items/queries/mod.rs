pub mod get;
pub mod list;

pub use get::GetItemError;
pub use list::ListItemsError;
