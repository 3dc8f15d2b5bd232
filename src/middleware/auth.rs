use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::token;
use crate::db::models::User;
use crate::error::ApiError;
use crate::router::AppState;

/// Identity resolved from the `Authorization: Bearer <token>` header.
///
/// Verifies signature and expiry, then resolves the embedded user id against
/// storage; a valid token whose user has vanished is treated the same as a
/// missing one.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header
            .trim()
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let claims = token::verify(token, &state.config.jwt_secret)?;
        let user_id = claims.user_id()?;

        let user = state
            .storage
            .user_by_id(user_id)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(Self(user))
    }
}
