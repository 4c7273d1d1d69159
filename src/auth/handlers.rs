use axum::{
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, CurrentUserResponse, LoginRequest, LogoutResponse, RegisterRequest,
            UpdateProfileRequest,
        },
        extractors::MaybeUser,
        repo_types::{ProfilePatch, User},
        services::{self, Credentials, NewRegistration},
        session::SessionCookie,
    },
    error::{ApiError, AuthApiError},
    extract::AppJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/current", get(current))
        .route("/auth/update", put(update))
}

/// Issues a token for `user` and returns the headers that carry it.
fn session_headers(state: &AppState, user: &User) -> Result<HeaderMap, AuthApiError> {
    let token = state.tokens.issue(&user.session_claims()).map_err(|e| {
        error!(error = %e, "session token issue failed");
        AuthApiError::from(e)
    })?;
    let mut headers = HeaderMap::new();
    SessionCookie::from_ref(state).attach(&mut headers, &token)?;
    Ok(headers)
}

#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    body: Result<AppJson<RegisterRequest>, ApiError>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), AuthApiError> {
    let AppJson(req) = body?;
    let input = NewRegistration::try_from(req)?;

    let user = services::register(state.users.as_ref(), input)
        .await
        .map_err(ApiError::from)?;
    let headers = session_headers(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        headers,
        Json(AuthResponse {
            success: true,
            user,
        }),
    ))
}

#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    body: Result<AppJson<LoginRequest>, ApiError>,
) -> Result<(HeaderMap, Json<AuthResponse>), AuthApiError> {
    let AppJson(req) = body?;
    let creds = Credentials::try_from(req)?;

    let user = services::authenticate(state.users.as_ref(), creds)
        .await
        .map_err(ApiError::from)?;
    let headers = session_headers(&state, &user)?;

    Ok((
        headers,
        Json(AuthResponse {
            success: true,
            user,
        }),
    ))
}

/// Clears the cookie only; the token itself is not revoked.
#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
) -> Result<(HeaderMap, Json<LogoutResponse>), AuthApiError> {
    let mut headers = HeaderMap::new();
    SessionCookie::from_ref(&state).clear(&mut headers)?;
    info!("session cookie cleared");
    Ok((headers, Json(LogoutResponse { success: true })))
}

#[instrument(skip(state, session))]
pub async fn current(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
) -> Result<Json<CurrentUserResponse>, AuthApiError> {
    let Some(claims) = session else {
        return Ok(Json(CurrentUserResponse { user: None }));
    };
    let user = state.users.find_by_id(claims.user_id).await?;
    if user.is_none() {
        warn!(user_id = %claims.user_id, "token refers to a missing user");
    }
    Ok(Json(CurrentUserResponse { user }))
}

#[instrument(skip(state, session, body))]
pub async fn update(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
    body: Result<AppJson<UpdateProfileRequest>, ApiError>,
) -> Result<Json<AuthResponse>, AuthApiError> {
    let claims = session.ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))?;
    let AppJson(req) = body?;
    let patch = ProfilePatch::try_from(req)?;

    let user = services::update_profile(state.users.as_ref(), claims.user_id, patch)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(AuthResponse {
        success: true,
        user,
    }))
}
