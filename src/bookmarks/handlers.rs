use axum::{extract::State, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    dto::{BookmarksQuery, CheckBookmarkQuery, CheckBookmarkResponse, ToggleBookmarkRequest, ToggleBookmarkResponse},
    repo::Bookmark,
};
use crate::{
    auth::extractors::AuthUser,
    envelope::Envelope,
    error::{ApiError, ApiResult, UniqueViolation},
    extract::{AppJson, AppQuery},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookmarks", get(list_bookmarks).post(toggle_bookmark))
        .route("/bookmarks/check", get(check_bookmark))
}

#[instrument(skip(state))]
pub async fn list_bookmarks(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<BookmarksQuery>,
) -> ApiResult<Json<Envelope<Vec<Bookmark>>>> {
    let user_id = q
        .user_id
        .ok_or_else(|| ApiError::Validation("User ID is required".into()))?;
    Ok(Json(Envelope::ok(state.bookmarks.list_by_user(user_id).await?)))
}

/// Adds the bookmark if absent, removes it if present.
#[instrument(skip(state, user, req), fields(user_id = %user.id()))]
pub async fn toggle_bookmark(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<ToggleBookmarkRequest>,
) -> ApiResult<Json<ToggleBookmarkResponse>> {
    let post_id = req
        .post_id
        .ok_or_else(|| ApiError::Validation("Post ID is required".into()))?;
    let user_id = user.id();

    let message = match state.bookmarks.find(user_id, post_id).await? {
        Some(existing) => {
            state.bookmarks.delete(existing.id).await?;
            info!(%post_id, "bookmark removed");
            "Bookmark removed"
        }
        None => {
            if state.posts.find_by_id(post_id).await?.is_none() {
                return Err(ApiError::NotFound("Post not found".into()));
            }
            let added = state
                .bookmarks
                .insert(Bookmark {
                    id: Uuid::new_v4(),
                    user_id,
                    post_id,
                    created_at: OffsetDateTime::now_utc(),
                })
                .await;
            match added {
                Ok(_) => info!(%post_id, "bookmark added"),
                // a concurrent toggle added it first
                Err(e) if UniqueViolation::is(&e) => debug!(%post_id, "bookmark already present"),
                Err(e) => return Err(e.into()),
            }
            "Bookmark added"
        }
    };

    Ok(Json(ToggleBookmarkResponse {
        success: true,
        message,
        bookmarks: state.bookmarks.list_by_user(user_id).await?,
    }))
}

#[instrument(skip(state))]
pub async fn check_bookmark(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<CheckBookmarkQuery>,
) -> ApiResult<Json<CheckBookmarkResponse>> {
    let (Some(user_id), Some(post_id)) = (q.user_id, q.post_id) else {
        return Err(ApiError::Validation("User ID and Post ID are required".into()));
    };
    let is_bookmarked = state.bookmarks.find(user_id, post_id).await?.is_some();
    Ok(Json(CheckBookmarkResponse {
        success: true,
        is_bookmarked,
    }))
}
