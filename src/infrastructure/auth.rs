//! Borrower authentication
//!
//! Passwords are stored as argon2 PHC strings. A borrower who passes both
//! login factors receives a bearer token whose subject is the borrower id;
//! the lending handlers take that id as the checkout user.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Json},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::DomainError;
use crate::infrastructure::config::Config;

/// Signing secret used by debug builds when none is configured
const DEV_SECRET: &str = "asset-lending-dev-secret";

/// Claims carried by a borrower bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowerClaims {
    /// Borrower (user credential) id
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

/// HMAC keys for issuing and checking borrower tokens
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(24),
        }
    }

    /// Keys from `Config::jwt_secret`. Release builds refuse to start without one.
    pub fn from_config(config: &Config) -> Result<Self, String> {
        match config.jwt_secret.as_deref() {
            Some(secret) => Ok(Self::new(secret)),
            None if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set, signing tokens with the development secret");
                Ok(Self::new(DEV_SECRET))
            }
            None => Err("JWT_SECRET must be set in release builds".to_string()),
        }
    }

    pub fn issue(&self, user_id: &str, email: &str) -> Result<String, DomainError> {
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| DomainError::Internal("token expiry out of range".to_string()))?;

        let claims = BorrowerClaims {
            sub: user_id.to_owned(),
            email: email.to_owned(),
            exp: expires_at.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| DomainError::Internal(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<BorrowerClaims, jsonwebtoken::errors::Error> {
        decode::<BorrowerClaims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
    }
}

fn unauthorized(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message })))
}

#[async_trait]
impl<S> FromRequestParts<S> for BorrowerClaims
where
    Arc<TokenKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization header format"))?;

        let keys = Arc::<TokenKeys>::from_ref(state);
        keys.verify(token).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            unauthorized("Invalid or expired token")
        })
    }
}

pub fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::Internal(e.to_string()))
}

/// A stored hash that does not parse never matches
pub fn password_matches(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Unreadable password hash: {}", e);
            false
        }
    }
}
