// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Role value that grants admin access
pub const ADMIN_ROLE: &str = "admin";

/// Role given to newly registered users
pub const DEFAULT_ROLE: &str = "user";

/// User database model
///
/// Deliberately not `Serialize`: the password hash must never leave the
/// server. Responses go through the DTOs below.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Fields to change on a stored user; `None` leaves the column untouched
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserChanges {
    pub fn at(updated_at: DateTime<Utc>) -> Self {
        Self {
            name: None,
            password_hash: None,
            role: None,
            updated_at,
        }
    }
}

/// Identity resolved by the auth middleware for the current request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Lower-case and trim an email so lookups and the unique index agree
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Login request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Update request DTO; an empty or missing field means "no change"
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub name: String,
    #[serde(default)]
    #[validate(custom = "validate_new_password")]
    pub password: String,
}

fn validate_new_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    if password.is_empty() || (8..=128).contains(&length) {
        Ok(())
    } else {
        Err(ValidationError::new("password_length"))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisteredUser {
    pub id: Uuid,
    pub email: String,
}

/// Registration response DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub user: RegisteredUser,
}

/// Login response DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub admin: bool,
}

/// Current user DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckUserResponse {
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidateResponse {
    pub validate: String,
}

/// User response model (excludes password_hash)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
