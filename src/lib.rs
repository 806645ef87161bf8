// Hotel API: authentication core and HTTP surface

pub mod auth;
pub mod config;
pub mod db;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{any, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth::{handlers, models, AuthService};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_handler,
        handlers::login_handler,
        handlers::check_user_handler,
        handlers::update_user_handler,
        handlers::validate_token_handler,
        handlers::get_user_handler,
        handlers::grant_admin_handler,
        handlers::revoke_admin_handler,
        handlers::delete_user_handler,
    ),
    components(
        schemas(
            models::RegisterRequest,
            models::RegisterResponse,
            models::RegisteredUser,
            models::LoginRequest,
            models::LoginResponse,
            models::CheckUserResponse,
            models::UpdateUserRequest,
            models::MessageResponse,
            models::ValidateResponse,
            models::UserResponse,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and session endpoints"),
        (name = "admin", description = "User administration, admin role required")
    ),
    info(
        title = "Hotel API",
        version = "0.1.0",
        description = "Authentication core of the hotel management API"
    )
)]
pub struct ApiDoc;

/// Creates and configures the application router
///
/// Public routes: register and login. `/auth/*` session routes sit behind
/// `require_auth`, `/admin/*` behind `require_admin`.
pub fn create_router(service: Arc<AuthService>, request_timeout: Duration) -> Router {
    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let authenticated = Router::new()
        .route(
            "/auth/me",
            get(handlers::check_user_handler).put(handlers::update_user_handler),
        )
        .route("/auth/validate", any(handlers::validate_token_handler))
        .route_layer(middleware::from_fn_with_state(
            service.clone(),
            auth::require_auth,
        ));

    let admin = Router::new()
        .route(
            "/admin/users/:id",
            get(handlers::get_user_handler).delete(handlers::delete_user_handler),
        )
        .route("/admin/users/:id/grant", post(handlers::grant_admin_handler))
        .route("/admin/users/:id/revoke", post(handlers::revoke_admin_handler))
        .route_layer(middleware::from_fn_with_state(
            service.clone(),
            auth::require_admin,
        ));

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes
        .route("/auth/register", post(handlers::register_handler))
        .route("/auth/login", post(handlers::login_handler))
        // Protected routes
        .merge(authenticated)
        .merge(admin)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}
