use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::double_option;

text_enum!(UserRole {
    Admin => "admin",
    Staff => "staff",
    Customer => "customer",
});

impl UserRole {
    /// Staff and admins may use the back office.
    pub fn is_back_office(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Staff)
    }
}

/// Upper bound on accounts holding the admin role.
pub const MAX_ADMINS: i64 = 2;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn default_role() -> UserRole {
    UserRole::Staff
}

/// Admin-facing create payload. The password is hashed before it reaches the store.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(length(min = 3, max = 50, message = "must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(email(message = "is not a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: UserRole,
}

impl NewUserRecord {
    pub fn into_user(self, id: Uuid, now: NaiveDateTime) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            full_name: self.full_name,
            role: self.role,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[validate(length(min = 3, max = 50, message = "must be between 3 and 50 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "is not a valid email address"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 100))]
    pub full_name: Option<Option<String>>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(full_name) = self.full_name {
            user.full_name = full_name;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: User,
}
