// Authentication module
// Provides JWT-based authentication with user registration, login, token
// verification and admin-only authorization

pub mod clock;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use clock::{Clock, SystemClock};
pub use error::AuthError;
pub use handlers::{
    check_user_handler, delete_user_handler, get_user_handler, grant_admin_handler,
    login_handler, register_handler, revoke_admin_handler, update_user_handler,
    validate_token_handler,
};
pub use middleware::{require_admin, require_auth};
pub use models::{CurrentUser, User};
pub use password::PasswordService;
pub use repository::{PgUserRepository, UserRepository};
pub use service::AuthService;
pub use token::TokenService;
