use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Every failure a handler can surface. `status` is the only place a kind
/// is mapped to an HTTP code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// A write refused by a unique constraint. Stores return it inside
/// `anyhow::Error` so racing duplicates can still be answered as conflicts.
#[derive(Debug, Error)]
#[error("unique constraint violated on {0}")]
pub struct UniqueViolation(pub &'static str);

impl UniqueViolation {
    pub fn is(e: &anyhow::Error) -> bool {
        e.downcast_ref::<UniqueViolation>().is_some()
    }
}

impl ApiError {
    pub fn unauthenticated() -> Self {
        ApiError::Unauthorized("Authentication required".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            // duplicates answer 400, not 409
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Store write failure: a unique violation becomes `Conflict(message)`,
    /// anything else stays internal.
    pub fn from_write(e: anyhow::Error, message: &str) -> Self {
        if UniqueViolation::is(&e) {
            ApiError::Conflict(message.into())
        } else {
            ApiError::Internal(e)
        }
    }

    /// Message safe to put on the wire.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "internal error");
                "An unexpected error occurred".into()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.public_message();
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

/// Auth endpoints answer with a bare `{error}` object instead of the
/// resource envelope. Same status table as [`ApiError`].
#[derive(Debug)]
pub struct AuthApiError(pub ApiError);

impl From<ApiError> for AuthApiError {
    fn from(e: ApiError) -> Self {
        AuthApiError(e)
    }
}

impl From<anyhow::Error> for AuthApiError {
    fn from(e: anyhow::Error) -> Self {
        AuthApiError(ApiError::Internal(e))
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let message = self.0.public_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table_is_exhaustive() {
        let cases = [
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err:?}");
        }
    }

    #[test]
    fn internal_details_stay_off_the_wire() {
        let err = ApiError::Internal(anyhow::anyhow!("password_hash column missing"));
        assert_eq!(err.public_message(), "An unexpected error occurred");
    }

    #[test]
    fn unique_violations_on_write_become_conflicts() {
        let err = ApiError::from_write(UniqueViolation("posts.slug").into(), "taken");
        assert!(matches!(err, ApiError::Conflict(ref m) if m == "taken"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from_write(anyhow::anyhow!("connection reset"), "taken");
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn unique_violation_survives_context() {
        let e = anyhow::Error::new(UniqueViolation("users.email")).context("insert user");
        assert!(UniqueViolation::is(&e));
        assert!(!UniqueViolation::is(&anyhow::anyhow!("other")));
    }

    #[test]
    fn auth_errors_keep_the_status_table() {
        let resp = AuthApiError(ApiError::Unauthorized("nope".into())).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let resp = ApiError::Forbidden("nope".into()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
