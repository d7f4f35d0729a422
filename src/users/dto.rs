use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::{
    repo_types::User,
    services::{DEFAULT_LIMIT, DEFAULT_OFFSET},
};

/// Request body for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_superuser: bool,
    pub password: String,
}

/// Request body for a partial update; absent or null fields are left alone.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub is_superuser: Option<bool>,
    pub password: Option<String>,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_superuser: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            is_superuser: u.is_superuser,
            created_at: u.created_at,
            updated_at: u.updated_at,
            deleted_at: u.deleted_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

impl Default for DeleteResponse {
    fn default() -> Self {
        Self {
            message: "success".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_offset")]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}
fn default_offset() -> i64 { DEFAULT_OFFSET }
fn default_limit() -> i64 { DEFAULT_LIMIT }

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "Joseph".into(),
            last_name: "Ya'aqov".into(),
            email: "joseph.yaaqov@gmail.com".into(),
            hashed_password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            is_superuser: false,
            created_at: datetime!(2024-05-06 01:49:00 UTC),
            updated_at: datetime!(2024-05-06 01:49:00 UTC),
            deleted_at: None,
        }
    }

    #[test]
    fn response_never_exposes_password() {
        let json = serde_json::to_value(UserResponse::from(sample_user())).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("password"));
        assert!(!obj.contains_key("hashed_password"));
        assert_eq!(obj["email"], "joseph.yaaqov@gmail.com");
        assert_eq!(obj["created_at"], "2024-05-06T01:49:00Z");
        assert!(obj["deleted_at"].is_null());
    }

    #[test]
    fn user_row_skips_hash_when_serialized() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn update_request_treats_missing_fields_as_unset() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"first_name": "Fulton", "is_superuser": null}"#).unwrap();
        assert_eq!(req.first_name.as_deref(), Some("Fulton"));
        assert!(req.last_name.is_none());
        assert!(req.is_superuser.is_none());
        assert!(req.password.is_none());
    }

    #[test]
    fn delete_response_says_success() {
        assert_eq!(
            serde_json::to_value(DeleteResponse::default()).unwrap(),
            serde_json::json!({"message": "success"})
        );
    }
}
