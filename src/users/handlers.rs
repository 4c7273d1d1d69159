use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    envelope::Envelope,
    error::{ApiError, ApiResult},
    extract::AppPath,
    posts::repo::{Post, PostFilter},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .route("/users/:id/posts", get(list_user_posts))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Envelope<Vec<User>>>> {
    Ok(Json(Envelope::ok(state.users.list().await?)))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Envelope<User>>> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(Envelope::ok(user)))
}

/// Published posts only; drafts stay private to their author.
#[instrument(skip(state))]
pub async fn list_user_posts(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Envelope<Vec<Post>>>> {
    let filter = PostFilter {
        author_id: Some(id),
        ..PostFilter::published()
    };
    let (posts, _) = state.posts.list(&filter, None).await?;
    Ok(Json(Envelope::ok(posts)))
}
