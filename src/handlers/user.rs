use axum::extract::State;
use axum::Json;

use crate::db::models::UserView;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::router::AppState;

/// Profile of the authenticated user, re-read from storage.
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserView>, ApiError> {
    let user = state
        .storage
        .user_by_id(user.id)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(Json(UserView::from(user)))
}
