pub mod queries;
pub mod routes;

pub use queries::UserMeResponse;
pub use routes::users_routes;
