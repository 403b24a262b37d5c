use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedIdentity;

/// Response of `GET /v1/users/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMeResponse {
    pub id: Uuid,
    pub email: String,
}

/// Echo the verified caller; nothing is looked up
pub fn handle(identity: &AuthenticatedIdentity) -> UserMeResponse {
    UserMeResponse {
        id: identity.id,
        email: identity.email.clone(),
    }
}
