use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::models::BookmarkStatus;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::router::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total: i64,
    pub read: i64,
    pub reading: i64,
    pub unread: i64,
    pub by_category: Vec<CategoryCount>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Aggregate view over the authenticated user's collection: total count,
/// zero-filled per-status counts, and a per-category histogram sorted by
/// count descending.
pub async fn stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let total = state.storage.count_bookmarks(user.id).await?;

    let mut response = StatsResponse {
        total,
        read: 0,
        reading: 0,
        unread: 0,
        by_category: Vec::new(),
    };

    for (status, count) in state.storage.count_by_status(user.id).await? {
        match status.parse::<BookmarkStatus>() {
            Ok(BookmarkStatus::Read) => response.read = count,
            Ok(BookmarkStatus::Reading) => response.reading = count,
            Ok(BookmarkStatus::Unread) => response.unread = count,
            Err(_) => {}
        }
    }

    response.by_category = state
        .storage
        .count_by_category(user.id)
        .await?
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();

    Ok(Json(response))
}
