pub mod me;

pub use me::UserMeResponse;
