// Credential store: the persistence boundary for users

use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::{User, UserChanges},
};

/// Storage contract the auth service depends on
///
/// Implementations enforce email uniqueness atomically and report a
/// violation as `AuthError::DuplicateEmail`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user
    async fn create(&self, user: &User) -> Result<(), AuthError>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;

    /// Find a user by (normalized) email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    /// Apply the `Some` fields of `changes`; `IdentityNotFound` if no row matched
    async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<(), AuthError>;

    /// Remove a user; `IdentityNotFound` if no row matched
    async fn delete(&self, id: Uuid) -> Result<(), AuthError>;
}

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &User) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Check for unique constraint violation
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::DuplicateEmail;
                }
            }
            AuthError::DatabaseError(e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                password_hash = COALESCE($3, password_hash),
                role = COALESCE($4, role),
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.password_hash.as_deref())
        .bind(changes.role.as_deref())
        .bind(changes.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::IdentityNotFound);
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AuthError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::IdentityNotFound);
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemoryUserRepository;
    use super::*;
    use crate::auth::models::DEFAULT_ROLE;
    use chrono::Utc;

    fn sample_user(email: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".to_string(),
            role: DEFAULT_ROLE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Helper function to create a test database pool
    async fn create_test_pool() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must be set for database tests");

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    fn unique_email() -> String {
        format!("test{}@example.com", Uuid::new_v4().simple())
    }

    async fn exercise_contract(repo: &dyn UserRepository, email: &str) {
        let user = sample_user(email);
        repo.create(&user).await.expect("create");

        let duplicate = sample_user(email);
        assert!(matches!(
            repo.create(&duplicate).await,
            Err(AuthError::DuplicateEmail)
        ));

        let by_id = repo.find_by_id(user.id).await.unwrap().expect("by id");
        assert_eq!(by_id.email, email);
        let by_email = repo.find_by_email(email).await.unwrap().expect("by email");
        assert_eq!(by_email.id, user.id);

        let mut changes = UserChanges::at(Utc::now());
        changes.name = Some("Renamed".to_string());
        repo.update(user.id, &changes).await.unwrap();

        let updated = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.password_hash, user.password_hash);
        assert_eq!(updated.role, user.role);

        repo.delete(user.id).await.unwrap();
        assert!(repo.find_by_id(user.id).await.unwrap().is_none());
        assert!(matches!(
            repo.update(user.id, &changes).await,
            Err(AuthError::IdentityNotFound)
        ));
        assert!(matches!(
            repo.delete(user.id).await,
            Err(AuthError::IdentityNotFound)
        ));
    }

    #[tokio::test]
    async fn test_memory_repository_contract() {
        let repo = MemoryUserRepository::new();
        exercise_contract(&repo, "alice@example.com").await;
    }

    #[tokio::test]
    async fn test_memory_repository_offline() {
        let repo = MemoryUserRepository::new();
        repo.go_offline();

        assert!(matches!(
            repo.find_by_email("alice@example.com").await,
            Err(AuthError::DatabaseError(_))
        ));
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_pg_repository_contract() {
        let pool = create_test_pool().await;
        let repo = PgUserRepository::new(pool);
        exercise_contract(&repo, &unique_email()).await;
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_pg_find_missing_user() {
        let pool = create_test_pool().await;
        let repo = PgUserRepository::new(pool);

        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
        assert!(repo.find_by_email(&unique_email()).await.unwrap().is_none());
    }
}
