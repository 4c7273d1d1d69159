use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{CreatePostRequest, ListPostsQuery, NewPost, PostPatch, UpdatePostRequest},
    repo::Post,
    services::{apply_patch, build_post},
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
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:slug",
            get(get_post).put(update_post).delete(delete_post),
        )
}

const SLUG_TAKEN: &str = "A post with this slug already exists";

async fn load_post(state: &AppState, slug: &str) -> ApiResult<Post> {
    state
        .posts
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".into()))
}

async fn ensure_slug_free(state: &AppState, slug: &str) -> ApiResult<()> {
    if slug.is_empty() {
        return Err(ApiError::Validation("Slug cannot be empty".into()));
    }
    if state.posts.find_by_slug(slug).await?.is_some() {
        warn!(%slug, "slug already taken");
        return Err(ApiError::Conflict(SLUG_TAKEN.into()));
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<ListPostsQuery>,
) -> ApiResult<Json<ListEnvelope<Post>>> {
    let page = q.page();
    let (posts, total) = state.posts.list(&q.filter(), Some(page)).await?;
    Ok(Json(ListEnvelope::new(posts, total, page)))
}

/// Reads also bump the view counter; concurrent reads may each count.
#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> ApiResult<Json<Envelope<Post>>> {
    let post = load_post(&state, &slug).await?;
    state.posts.increment_views(post.id).await?;
    Ok(Json(Envelope::ok(post)))
}

#[instrument(skip(state, user, req), fields(user_id = %user.id()))]
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<Post>>)> {
    let input = NewPost::try_from(req)?;
    let author = state
        .users
        .find_by_id(user.id())
        .await?
        .ok_or_else(ApiError::unauthenticated)?;

    let post = build_post(&author, input);
    ensure_slug_free(&state, &post.slug).await?;
    let post = state
        .posts
        .insert(post)
        .await
        .map_err(|e| ApiError::from_write(e, SLUG_TAKEN))?;

    info!(post_id = %post.id, slug = %post.slug, "post created");
    Ok((StatusCode::CREATED, Json(Envelope::ok(post))))
}

#[instrument(skip(state, user, req), fields(user_id = %user.id()))]
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(slug): AppPath<String>,
    AppJson(req): AppJson<UpdatePostRequest>,
) -> ApiResult<Json<Envelope<Post>>> {
    let mut post = load_post(&state, &slug).await?;
    assert_owner(user.id(), &post)?;

    let patch = PostPatch::try_from(req)?;
    apply_patch(&mut post, patch);
    if post.slug != slug {
        ensure_slug_free(&state, &post.slug).await?;
    }

    let updated = state
        .posts
        .update(&post)
        .await
        .map_err(|e| ApiError::from_write(e, SLUG_TAKEN))?;
    if !updated {
        return Err(ApiError::NotFound("Post not found".into()));
    }
    info!(post_id = %post.id, "post updated");
    Ok(Json(Envelope::ok(post)))
}

#[instrument(skip(state, user), fields(user_id = %user.id()))]
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(slug): AppPath<String>,
) -> ApiResult<Json<Envelope<()>>> {
    let post = load_post(&state, &slug).await?;
    assert_owner(user.id(), &post)?;

    state.posts.delete(post.id).await?;
    info!(post_id = %post.id, "post deleted");
    Ok(Json(Envelope::message("Post deleted successfully")))
}
