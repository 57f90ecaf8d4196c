use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Token claims. The admin flag is baked into the token at login, so a
/// freshly granted or revoked role only takes effect on the next login.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub is_admin: bool,
    pub iat: usize,
    pub exp: usize,
}

/// HS256 signing keys plus the token lifetime, derived once from the
/// configured secret and shared across workers.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user_id: Uuid, is_admin: bool) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            is_admin,
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    /// Decodes and validates a token, returning its claims. Expired,
    /// tampered, and otherwise malformed tokens all map to the same
    /// credential error.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_decode_roundtrip() {
        let keys = TokenKeys::new("test-secret", 24);
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, true).unwrap();
        let claims = keys.decode(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert!(claims.is_admin);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new("test-secret", -1);
        let token = keys.issue(Uuid::new_v4(), false).unwrap();
        assert!(keys.decode(&token).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let keys = TokenKeys::new("test-secret", 24);
        let other = TokenKeys::new("different-secret", 24);
        let token = keys.issue(Uuid::new_v4(), false).unwrap();
        assert!(other.decode(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let keys = TokenKeys::new("test-secret", 24);
        assert!(keys.decode("not.a.token").is_err());
    }
}
