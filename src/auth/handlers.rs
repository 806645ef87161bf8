// HTTP handlers for authentication endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::{
        CheckUserResponse, CurrentUser, LoginRequest, LoginResponse, MessageResponse,
        RegisterRequest, RegisterResponse, RegisteredUser, UpdateUserRequest, UserResponse,
        ValidateResponse,
    },
    service::AuthService,
};
use crate::validation::ValidatedJson;

/// Register a new user
/// POST /auth/register
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Invalid body or email already registered", body = String, example = json!({"error": "Email already registered"})),
        (status = 500, description = "Internal server error", body = String, example = json!({"error": "Internal server error"}))
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(service): State<Arc<AuthService>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthError> {
    let user = service
        .register(&request.email, &request.password, &request.name)
        .await?;

    let response = RegisterResponse {
        user: RegisteredUser {
            id: user.id,
            email: user.email,
        },
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login a user
/// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Invalid body", body = String),
        (status = 401, description = "Invalid email or password", body = String, example = json!({"error": "Invalid email or password"}))
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(service): State<Arc<AuthService>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let outcome = service.login(&request.email, &request.password).await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        admin: outcome.is_admin,
    }))
}

/// Get current user information (protected endpoint)
/// GET /auth/me
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = CheckUserResponse),
        (status = 401, description = "Not authenticated", body = String),
        (status = 403, description = "No identity in request context", body = String)
    ),
    tag = "auth"
)]
pub async fn check_user_handler(
    current: Option<Extension<CurrentUser>>,
) -> Result<Json<CheckUserResponse>, AuthError> {
    let Extension(CurrentUser(user)) = current.ok_or(AuthError::Forbidden)?;

    Ok(Json(CheckUserResponse {
        name: user.name,
        email: user.email,
        role: user.role,
    }))
}

/// Update the current user's name and/or password (protected endpoint)
/// PUT /auth/me
#[utoipa::path(
    put,
    path = "/auth/me",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = MessageResponse),
        (status = 400, description = "Invalid body", body = String),
        (status = 401, description = "Not authenticated", body = String),
        (status = 500, description = "Internal server error", body = String)
    ),
    tag = "auth"
)]
pub async fn update_user_handler(
    State(service): State<Arc<AuthService>>,
    current: Option<Extension<CurrentUser>>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let Extension(CurrentUser(user)) = current.ok_or(AuthError::Unauthorized)?;

    service
        .update_credentials(user.id, &request.name, &request.password)
        .await
        .map_err(|e| match e {
            // The row vanished between verification and update
            AuthError::IdentityNotFound => AuthError::Unauthorized,
            other => other,
        })?;

    Ok(Json(MessageResponse {
        message: "User updated successfully".to_string(),
    }))
}

/// Confirm that the presented token is valid (protected endpoint)
/// ANY /auth/validate
#[utoipa::path(
    get,
    path = "/auth/validate",
    responses(
        (status = 200, description = "Token valid", body = ValidateResponse),
        (status = 401, description = "Not authenticated", body = String)
    ),
    tag = "auth"
)]
pub async fn validate_token_handler() -> Json<ValidateResponse> {
    Json(ValidateResponse {
        validate: "Token valid".to_string(),
    })
}

fn not_found_as_404(user_id: Uuid) -> impl FnOnce(AuthError) -> AuthError {
    move |e| match e {
        AuthError::IdentityNotFound => AuthError::UserNotFound(user_id),
        other => other,
    }
}

/// Get any user by ID (admin only)
/// GET /admin/users/{id}
#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Not an authenticated admin", body = String),
        (status = 404, description = "User not found", body = String)
    ),
    tag = "admin"
)]
pub async fn get_user_handler(
    State(service): State<Arc<AuthService>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AuthError> {
    let user = service
        .get_by_id(user_id)
        .await
        .map_err(not_found_as_404(user_id))?;

    Ok(Json(user.into()))
}

/// Grant the admin role (admin only)
/// POST /admin/users/{id}/grant
#[utoipa::path(
    post,
    path = "/admin/users/{id}/grant",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Role granted", body = UserResponse),
        (status = 401, description = "Not an authenticated admin", body = String),
        (status = 404, description = "User not found", body = String)
    ),
    tag = "admin"
)]
pub async fn grant_admin_handler(
    State(service): State<Arc<AuthService>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AuthError> {
    let user = service
        .grant_admin(user_id)
        .await
        .map_err(not_found_as_404(user_id))?;

    tracing::info!("Admin {} granted admin role to {}", admin.id, user.id);
    Ok(Json(user.into()))
}

/// Revoke the admin role (admin only)
/// POST /admin/users/{id}/revoke
#[utoipa::path(
    post,
    path = "/admin/users/{id}/revoke",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Role revoked", body = UserResponse),
        (status = 401, description = "Not an authenticated admin", body = String),
        (status = 404, description = "User not found", body = String)
    ),
    tag = "admin"
)]
pub async fn revoke_admin_handler(
    State(service): State<Arc<AuthService>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AuthError> {
    let user = service
        .revoke_admin(user_id)
        .await
        .map_err(not_found_as_404(user_id))?;

    tracing::info!("Admin {} revoked admin role from {}", admin.id, user.id);
    Ok(Json(user.into()))
}

/// Delete a user (admin only)
/// DELETE /admin/users/{id}
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Not an authenticated admin", body = String),
        (status = 404, description = "User not found", body = String)
    ),
    tag = "admin"
)]
pub async fn delete_user_handler(
    State(service): State<Arc<AuthService>>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AuthError> {
    service
        .delete_user(user_id)
        .await
        .map_err(not_found_as_404(user_id))?;

    Ok(StatusCode::NO_CONTENT)
}
