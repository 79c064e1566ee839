//! Token issuance and password hashing for the admin API.
//!
//! Tokens are HS256 JWTs carrying the admin id and an expiry. Every auth
//! failure surfaces as the same generic 401 so a caller cannot tell which
//! check rejected them.

use bcrypt::DEFAULT_COST;
use bookify_common::error::{internal_error, BookifyError};
use bookify_config::AdminConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Admin credential id.
    pub sub: String,
    pub exp: usize,
}

/// Signing material and token lifetime, shared by the login handler and
/// the auth middleware.
#[derive(Clone)]
pub struct AuthContext {
    secret: String,
    ttl: Duration,
}

impl AuthContext {
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            ttl: Duration::hours(config.token_ttl_hours),
        }
    }

    pub fn issue_token(&self, admin_id: &str) -> Result<String, BookifyError> {
        let exp = (Utc::now() + self.ttl).timestamp() as usize;
        let claims = Claims {
            sub: admin_id.to_string(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| internal_error(format!("Failed to sign token: {}", e)))
    }

    /// Decode and validate a bearer token. Expired or malformed tokens all
    /// map to the same `AuthError`.
    pub fn decode_token(&self, token: &str) -> Result<Claims, BookifyError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| BookifyError::AuthError)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

pub fn hash_password(password: &str) -> Result<String, BookifyError> {
    bcrypt::hash(password, DEFAULT_COST)
        .map_err(|e| internal_error(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, BookifyError> {
    bcrypt::verify(password, hash)
        .map_err(|e| internal_error(format!("Failed to verify password: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> AuthContext {
        AuthContext::new(&AdminConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_hours: 12,
            initial_email: None,
            initial_password: None,
            notify_email: None,
        })
    }

    #[test]
    fn issued_token_round_trips() {
        let ctx = context();
        let token = ctx.issue_token("admin-1").unwrap();
        let claims = ctx.decode_token(&token).unwrap();
        assert_eq!(claims.sub, "admin-1");
        assert!(claims.exp > Utc::now().timestamp() as usize);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let ctx = context();
        let other = AuthContext::new(&AdminConfig {
            jwt_secret: "different".to_string(),
            token_ttl_hours: 12,
            initial_email: None,
            initial_password: None,
            notify_email: None,
        });
        let token = other.issue_token("admin-1").unwrap();
        let err = ctx.decode_token(&token).unwrap_err();
        assert!(matches!(err, BookifyError::AuthError));
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }
}
