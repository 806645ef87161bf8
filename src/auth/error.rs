// Authentication and authorization error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Authentication and authorization error types
#[derive(Debug, Error)]
pub enum AuthError {
    // Request errors
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Email already registered")]
    DuplicateEmail,

    // Authentication errors
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Missing authentication token")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token carries a malformed user id")]
    MalformedUserId,
    /// Token verified, but the user it names no longer exists
    #[error("Identity not found")]
    IdentityNotFound,
    /// Generic rejection returned by the middleware; the reason is only logged
    #[error("Unauthorized")]
    Unauthorized,

    // Authorization errors
    #[error("Forbidden")]
    Forbidden,
    /// Lookup by an id supplied in the request path
    #[error("User {0} not found")]
    UserNotFound(uuid::Uuid),

    // Internal errors
    #[error("Password hashing error: {0}")]
    HashingFailure(String),
    #[error("Token generation error: {0}")]
    TokenGenerationError(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AuthError::DuplicateEmail => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::MalformedUserId
            | AuthError::IdentityNotFound
            | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AuthError::HashingFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::TokenGenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a descriptive error message for this error
    /// This message is safe to send to clients (no sensitive data)
    pub fn error_message(&self) -> String {
        match self {
            AuthError::ValidationError(msg) => msg.clone(),
            AuthError::DuplicateEmail => "Email already registered".to_string(),
            AuthError::InvalidCredentials => "Invalid email or password".to_string(),
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::MalformedUserId
            | AuthError::IdentityNotFound
            | AuthError::Unauthorized => "Unauthorized".to_string(),
            AuthError::Forbidden => "Forbidden".to_string(),
            AuthError::UserNotFound(id) => format!("User {} not found", id),
            AuthError::HashingFailure(_)
            | AuthError::TokenGenerationError(_)
            | AuthError::DatabaseError(_) => {
                "Internal server error".to_string()
            }
        }
    }

    /// True for failures of the server itself rather than of the caller
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::HashingFailure(_)
                | AuthError::TokenGenerationError(_)
                | AuthError::DatabaseError(_)
        )
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::HashingFailure(msg) => error!("Password hashing error: {}", msg),
            AuthError::TokenGenerationError(msg) => error!("Token generation error: {}", msg),
            AuthError::DatabaseError(e) => error!("Database error in auth: {:?}", e),
            AuthError::ValidationError(msg) => debug!("Rejected request body: {}", msg),
            AuthError::InvalidCredentials => warn!("Failed login attempt"),
            AuthError::Forbidden => warn!("Request without identity reached a protected handler"),
            _ => {}
        }

        let body = Json(json!({
            "error": self.error_message(),
        }));

        (self.status_code(), body).into_response()
    }
}
