use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account tier. New accounts default to the lowest tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Developer,
    #[default]
    Tester,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub name: String,
    pub email: String,              // stored trimmed and lower-cased
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    pub role: UserRole,
    pub is_active: bool,            // deactivated accounts keep their row
    pub created_at: OffsetDateTime, // creation timestamp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_never_serializes() {
        let user = User {
            id: Uuid::new_v4(),
            name: "A".into(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: UserRole::Tester,
            is_active: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let v = serde_json::to_value(&user).unwrap();
        assert!(v.get("password_hash").is_none());
        assert_eq!(v["email"], "a@x.com");
    }

    #[test]
    fn role_defaults_to_tester() {
        assert_eq!(UserRole::default(), UserRole::Tester);
        assert_eq!(serde_json::to_value(UserRole::Tester).unwrap(), "tester");
    }
}
