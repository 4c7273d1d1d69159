use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateCommentRequest, ListCommentsQuery, NewComment, UpdateCommentRequest},
    repo::Comment,
};
use crate::{
    auth::{authz::assert_owner, extractors::AuthUser},
    envelope::{Envelope, ListEnvelope},
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/comments", get(list_comments).post(create_comment))
        .route("/comments/:id", put(update_comment).delete(delete_comment))
}

async fn load_comment(state: &AppState, id: Uuid) -> ApiResult<Comment> {
    state
        .comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".into()))
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<ListCommentsQuery>,
) -> ApiResult<Json<ListEnvelope<Comment>>> {
    let page = q.page();
    let (comments, total) = state.comments.list(&q.filter(), page).await?;
    Ok(Json(ListEnvelope::new(comments, total, page)))
}

#[instrument(skip(state, user, req), fields(user_id = %user.id()))]
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<Comment>>)> {
    let input = NewComment::try_from(req)?;

    let post = state
        .posts
        .find_by_id(input.post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;
    let author = state
        .users
        .find_by_id(user.id())
        .await?
        .ok_or_else(ApiError::unauthenticated)?;

    let now = OffsetDateTime::now_utc();
    let comment = state
        .comments
        .insert(Comment {
            id: Uuid::new_v4(),
            post_id: post.id,
            post_title: post.title,
            post_slug: post.slug,
            author_id: author.id,
            author_name: author.name,
            author_avatar: author.avatar,
            content: input.content,
            is_verified: false,
            created_at: now,
            updated_at: now,
        })
        .await?;
    state.posts.adjust_comment_count(post.id, 1).await?;

    info!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");
    Ok((StatusCode::CREATED, Json(Envelope::ok(comment))))
}

#[instrument(skip(state, user, req), fields(user_id = %user.id()))]
pub async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateCommentRequest>,
) -> ApiResult<Json<Envelope<Comment>>> {
    let comment = load_comment(&state, id).await?;
    assert_owner(user.id(), &comment)?;

    let content = req.into_content()?;
    let comment = state
        .comments
        .update_content(id, &content)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".into()))?;
    info!(comment_id = %id, "comment updated");
    Ok(Json(Envelope::ok(comment)))
}

#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Envelope<()>>> {
    let comment = load_comment(&state, id).await?;
    assert_owner(user.id(), &comment)?;

    if state.comments.delete(id).await? {
        state.posts.adjust_comment_count(comment.post_id, -1).await?;
    }
    info!(comment_id = %id, "comment deleted");
    Ok(Json(Envelope::message("Comment deleted successfully")))
}
