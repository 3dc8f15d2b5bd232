use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Claims embedded in every access token (HS256).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user id, as decimal text.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: i64, expires_in: u64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            iat: now,
            exp: now + expires_in as i64,
        }
    }

    pub fn user_id(&self) -> Result<i64, ApiError> {
        self.sub.parse().map_err(|_| ApiError::InvalidToken)
    }
}

/// Sign a fresh token for the user with the configured lifetime.
pub fn issue(user_id: i64, secret: &str, expires_in: u64) -> Result<String, ApiError> {
    issue_claims(&Claims::new(user_id, expires_in), secret)
}

pub fn issue_claims(claims: &Claims, secret: &str) -> Result<String, ApiError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(ApiError::Token)
}

/// Verify signature and expiry. An expired signature is reported separately
/// from every other failure so clients can distinguish the two.
pub fn verify(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => ApiError::TokenExpired,
        _ => ApiError::InvalidToken,
    })
}
