use std::sync::Arc;

use hotel_api::{
    auth::{AuthService, PasswordService, PgUserRepository, SystemClock, TokenService},
    config::{Config, LogFormat},
    create_router, db,
};
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber in the configured output format
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = Config::from_env().expect("Invalid configuration");
    init_tracing(config.log_format);

    tracing::info!("Hotel API - Starting...");
    tracing::debug!("Loaded configuration: {:?}", config);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let auth_service = AuthService::new(
        Arc::new(PgUserRepository::new(db_pool)),
        PasswordService::new(config.hash_cost).expect("Invalid password hashing parameters"),
        TokenService::new(&config.jwt_secret),
        Arc::new(SystemClock),
    )
    .expect("Failed to initialize authentication service");

    // Create the application router
    let app = create_router(Arc::new(auth_service), config.request_timeout);

    // Start the Axum server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Hotel API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}
