use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthError, AuthenticatedIdentity};

/// The subset of token claims the service reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, must be a UUID
    pub sub: String,
    #[serde(default)]
    pub email: String,
    pub iss: String,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
}

impl Claims {
    pub fn identity(&self) -> Result<AuthenticatedIdentity, AuthError> {
        let id = Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidSubject)?;
        Ok(AuthenticatedIdentity {
            id,
            email: self.email.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_defaults_to_empty() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": "7b0a8c2e-64c4-4b4c-9d0e-3f1d8b7d9a11",
            "iss": "https://issuer.test",
            "exp": 1,
        }))
        .unwrap();

        let identity = claims.identity().unwrap();
        assert_eq!(identity.email, "");
        assert_eq!(identity.id.to_string(), "7b0a8c2e-64c4-4b4c-9d0e-3f1d8b7d9a11");
    }
}
