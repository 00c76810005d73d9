use crate::auth::repo_types::{User, UserRole};
use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// JWT payload used for authentication.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub exp: usize,  // expiration time
    pub iat: usize,  // issued at
    pub iss: String, // issuer
    pub aud: String, // audience
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
}

/// Request body for account creation. Absent fields deserialize to empty
/// strings so presence is checked by the handler, not the JSON layer.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
    pub old_password: String,
    pub new_password: String,
    pub role: Option<UserRole>,
}

/// Request body for a password change.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: user.is_active,
        }
    }
}

/// Response returned after account creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountResponse {
    pub success: bool,
    pub data: CreatedAccount,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedAccount {
    pub user: PublicUser,
}

/// Response returned after a password change.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChangePasswordResponse {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_tolerates_missing_fields() {
        let req: CreateAccountRequest = serde_json::from_str("{}").unwrap();
        assert!(req.name.is_empty());
        assert!(req.email.is_empty());
        assert!(req.old_password.is_empty());
        assert!(req.new_password.is_empty());
        assert!(req.role.is_none());
    }

    #[test]
    fn create_request_uses_camel_case_wire_names() {
        let req: CreateAccountRequest = serde_json::from_value(serde_json::json!({
            "name": "A",
            "email": "a@x.com",
            "oldPassword": "default1",
            "newPassword": "secret1",
            "role": "developer"
        }))
        .unwrap();
        assert_eq!(req.old_password, "default1");
        assert_eq!(req.new_password, "secret1");
        assert_eq!(req.role, Some(UserRole::Developer));
    }

    #[test]
    fn public_user_serializes_camel_case() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            name: "A".into(),
            email: "a@x.com".into(),
            role: UserRole::Tester,
            is_active: true,
        };
        let v = serde_json::to_value(&user).unwrap();
        assert_eq!(v["isActive"], true);
        assert_eq!(v["role"], "tester");
        assert!(v.get("password").is_none());
        assert!(v.get("passwordHash").is_none());
    }
}
