use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use crate::db::models::{BookmarkStatus, BookmarkView};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::router::AppState;
use crate::validation::{
    BookmarkId, CreateBookmarkPayload, UpdateBookmarkPayload, ValidatedJson,
};

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(new): ValidatedJson<CreateBookmarkPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let bookmark = state
        .storage
        .insert_bookmark(user.id, &new.title, &new.url, &new.category, new.status)
        .await?;
    Ok((StatusCode::CREATED, Json(BookmarkView::from(bookmark))))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<BookmarkView>>, ApiError> {
    let bookmarks = state.storage.bookmarks_for_user(user.id).await?;
    Ok(Json(bookmarks.into_iter().map(BookmarkView::from).collect()))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    BookmarkId(id): BookmarkId,
) -> Result<Json<BookmarkView>, ApiError> {
    let bookmark = state
        .storage
        .bookmark_for_user(user.id, id)
        .await?
        .ok_or(ApiError::BookmarkNotFound)?;
    Ok(Json(bookmark.into()))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    BookmarkId(id): BookmarkId,
    ValidatedJson(changes): ValidatedJson<UpdateBookmarkPayload>,
) -> Result<Json<BookmarkView>, ApiError> {
    let mut bookmark = state
        .storage
        .bookmark_for_user(user.id, id)
        .await?
        .ok_or(ApiError::BookmarkNotFound)?;

    if let Some(title) = changes.title {
        bookmark.title = title;
    }
    if let Some(url) = changes.url {
        bookmark.url = url;
    }
    if let Some(category) = changes.category {
        bookmark.category = category;
    }
    if let Some(status) = changes.status {
        bookmark.status = status;
    }
    bookmark.updated_at = Utc::now();

    state.storage.update_bookmark(&bookmark).await?;
    Ok(Json(bookmark.into()))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    BookmarkId(id): BookmarkId,
) -> Result<StatusCode, ApiError> {
    if state.storage.delete_bookmark(user.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::BookmarkNotFound)
    }
}

/// Forces status=read regardless of the current state, so repeat calls are
/// harmless.
pub async fn mark_as_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    BookmarkId(id): BookmarkId,
) -> Result<Json<BookmarkView>, ApiError> {
    let mut bookmark = state
        .storage
        .bookmark_for_user(user.id, id)
        .await?
        .ok_or(ApiError::BookmarkNotFound)?;

    bookmark.status = BookmarkStatus::Read;
    bookmark.updated_at = Utc::now();

    state.storage.update_bookmark(&bookmark).await?;
    Ok(Json(bookmark.into()))
}
