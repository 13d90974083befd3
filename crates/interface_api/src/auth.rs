//! Authentication
//!
//! Bearer tokens carry the caller's user id and role. The verified pair becomes
//! the [`Identity`] handed to every domain operation; request bodies never supply it.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{Identity, Role, UserId};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's role
    pub role: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Claims {
    /// Resolves the token subject and role into a caller identity
    pub fn identity(&self) -> Result<Identity, AuthError> {
        let user_id: UserId = self.sub.parse().map_err(|_| AuthError::InvalidToken)?;
        let role: Role = self
            .role
            .parse()
            .map_err(|_| AuthError::UnknownRole(self.role.clone()))?;
        Ok(Identity::new(user_id, role))
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

/// Creates a signed token for `identity`
///
/// # Arguments
///
/// * `identity` - Verified user id and role
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(identity: &Identity, secret: &str, expiration_secs: u64) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = i64::try_from(expiration_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or(AuthError::InvalidToken)?;

    let claims = Claims {
        sub: identity.user_id.to_string(),
        role: identity.role.as_str().to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Validates a token and resolves the caller identity in one step
pub fn authenticate(token: &str, secret: &str) -> Result<Identity, AuthError> {
    validate_token(token, secret)?.identity()
}
