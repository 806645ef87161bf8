// Authentication service - business logic layer

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::{
    clock::Clock,
    error::AuthError,
    models::{normalize_email, User, UserChanges, ADMIN_ROLE, DEFAULT_ROLE},
    password::PasswordService,
    repository::UserRepository,
    token::TokenService,
};

/// Outcome of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub is_admin: bool,
}

/// Authentication service coordinating all auth operations
///
/// Holds no per-request state. The only shared data is the signing key,
/// read-only after construction.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    passwords: PasswordService,
    tokens: TokenService,
    clock: Arc<dyn Clock>,
    // Verified against when the email is unknown, so both login failures
    // cost the same.
    dummy_hash: String,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: PasswordService,
        tokens: TokenService,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let dummy_hash = passwords.hash_password("not-a-real-password")?;

        Ok(Self {
            users,
            passwords,
            tokens,
            clock,
            dummy_hash,
        })
    }

    /// Register a new user
    ///
    /// Uniqueness of the email is left to the repository; there is no
    /// lookup beforehand.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError> {
        let password_hash = self.hash_password(password).await?;
        let now = self.clock.now();

        let user = User {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            role: DEFAULT_ROLE.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.users.create(&user).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login a user
    ///
    /// Unknown email and wrong password both produce `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let user = self.users.find_by_email(&normalize_email(email)).await?;

        let Some(user) = user else {
            let _ = self.verify_password(password, &self.dummy_hash).await;
            tracing::debug!("Login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_password(password, &user.password_hash).await? {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, &user.role, self.clock.now())?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome {
            token,
            is_admin: user.is_admin(),
        })
    }

    /// Resolve a token to the user it names
    pub async fn verify(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.parse(token, self.clock.now())?;

        self.users
            .find_by_id(claims.user_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)
    }

    /// Resolve a token to an admin user
    ///
    /// A token whose claimed role is not admin is refused without a store
    /// lookup. Otherwise the live role decides.
    pub async fn verify_admin(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.parse(token, self.clock.now())?;
        if claims.role != ADMIN_ROLE {
            return Err(AuthError::Forbidden);
        }

        let user = self
            .users
            .find_by_id(claims.user_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        if !user.is_admin() {
            return Err(AuthError::Forbidden);
        }

        Ok(user)
    }

    /// Change name and/or password; empty strings leave a field unchanged
    pub async fn update_credentials(
        &self,
        user_id: Uuid,
        new_name: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let mut changes = UserChanges::at(self.clock.now());

        let new_name = new_name.trim();
        if !new_name.is_empty() {
            changes.name = Some(new_name.to_string());
        }
        if !new_password.is_empty() {
            changes.password_hash = Some(self.hash_password(new_password).await?);
        }

        self.users.update(user_id, &changes).await?;

        tracing::info!(
            user_id = %user_id,
            name_changed = changes.name.is_some(),
            password_changed = changes.password_hash.is_some(),
            "User updated"
        );
        Ok(())
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)
    }

    /// Give a user the admin role
    pub async fn grant_admin(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.set_role(user_id, ADMIN_ROLE).await
    }

    /// Return a user to the default role
    pub async fn revoke_admin(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.set_role(user_id, DEFAULT_ROLE).await
    }

    /// Delete a user; tokens already issued to them stop verifying
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.users.delete(user_id).await?;
        tracing::info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    async fn set_role(&self, user_id: Uuid, role: &str) -> Result<User, AuthError> {
        let mut changes = UserChanges::at(self.clock.now());
        changes.role = Some(role.to_string());

        self.users.update(user_id, &changes).await?;
        tracing::info!(user_id = %user_id, role, "User role changed");

        self.get_by_id(user_id).await
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let passwords = self.passwords.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || passwords.hash_password(&password))
            .await
            .map_err(|e| AuthError::HashingFailure(e.to_string()))?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let passwords = self.passwords.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || passwords.verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::HashingFailure(e.to_string()))?
    }
}
