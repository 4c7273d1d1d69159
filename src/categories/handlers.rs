use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{info, instrument, warn};

use super::{
    dto::{CategoryDetails, CreateCategoryRequest},
    repo::Category,
};
use crate::{
    auth::extractors::AuthUser,
    envelope::Envelope,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
    posts::repo::PostFilter,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:slug", get(get_category))
}

#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Envelope<Vec<Category>>>> {
    Ok(Json(Envelope::ok(state.categories.list().await?)))
}

#[instrument(skip(state, user, req), fields(user_id = %user.id()))]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<Category>>)> {
    let category = Category::try_from(req)?;

    if state.categories.find_by_name(&category.name).await?.is_some() {
        warn!(name = %category.name, "category already exists");
        return Err(ApiError::Conflict("Category already exists".into()));
    }
    if state.categories.find_by_slug(&category.slug).await?.is_some() {
        return Err(ApiError::Conflict("Category already exists".into()));
    }

    let category = state
        .categories
        .insert(category)
        .await
        .map_err(|e| ApiError::from_write(e, "Category already exists"))?;
    info!(category_id = %category.id, slug = %category.slug, "category created");
    Ok((StatusCode::CREATED, Json(Envelope::ok(category))))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> ApiResult<Json<Envelope<CategoryDetails>>> {
    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;

    let filter = PostFilter {
        category: Some(category.slug.clone()),
        ..PostFilter::published()
    };
    let (posts, _) = state.posts.list(&filter, None).await?;
    Ok(Json(Envelope::ok(CategoryDetails { category, posts })))
}
