// JWT token generation and validation service

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::error::AuthError;

/// How long an issued token stays valid
pub const TOKEN_TTL_HOURS: i64 = 24;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub role: String,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
}

/// Claims of a token that passed verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub user_id: Uuid,
    pub role: String,
    pub expires_at: i64,
}

/// Token service for JWT operations
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl TokenService {
    /// Create a new TokenService with secret key
    pub fn new(secret: &str) -> Self {
        // Only the HMAC family is accepted; expiry is checked against the
        // injected clock in `parse` rather than the system time.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token valid for 24 hours from `now`
    pub fn issue(&self, user_id: Uuid, role: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            user_id: user_id.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Verify signature, algorithm and expiry, then extract the claims
    pub fn parse(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedClaims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                AuthError::InvalidToken
            })?;

        if claims.exp <= now.timestamp() {
            tracing::debug!("Token expired at {}", claims.exp);
            return Err(AuthError::InvalidToken);
        }

        let user_id = Uuid::parse_str(&claims.user_id).map_err(|_| AuthError::MalformedUserId)?;

        Ok(VerifiedClaims {
            user_id,
            role: claims.role,
            expires_at: claims.exp,
        })
    }
}
