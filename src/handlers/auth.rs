use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{password, token};
use crate::db::models::UserView;
use crate::error::ApiError;
use crate::router::AppState;
use crate::validation::{LoginPayload, RegisterPayload, ValidatedJson};

/// Successful login body.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(registration): ValidatedJson<RegisterPayload>,
) -> Result<impl IntoResponse, ApiError> {
    if state
        .storage
        .user_by_email(&registration.email)
        .await?
        .is_some()
    {
        return Err(ApiError::EmailAlreadyExists);
    }

    let password_hash = password::hash_password(&registration.password)?;
    // The unique index on email backstops a concurrent duplicate.
    let user = state
        .storage
        .insert_user(&registration.name, &registration.email, &password_hash)
        .await?;

    info!(user_id = user.id, "registered user");
    Ok((StatusCode::CREATED, Json(UserView::from(user))))
}

/// Unknown email and wrong password produce the same response, so callers
/// cannot probe which addresses are registered.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(credentials): ValidatedJson<LoginPayload>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .storage
        .user_by_email(&credentials.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !password::verify_password(&credentials.password, &user.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let expires_in = state.config.jwt_expires_in;
    let access_token = token::issue(user.id, &state.config.jwt_secret, expires_in)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in,
    }))
}
