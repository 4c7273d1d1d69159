use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use tracing::debug;
use uuid::Uuid;

use super::{claims::SessionClaims, jwt::TokenCodec, session};
use crate::error::ApiError;

/// Recovers the caller's identity. Missing, malformed, expired and forged
/// tokens all come back as `None`.
pub fn resolve(headers: &HeaderMap, codec: &TokenCodec) -> Option<SessionClaims> {
    let token = session::extract(headers)?;
    match codec.verify(&token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            debug!(error = %e, "discarding session token");
            None
        }
    }
}

/// Caller identity, or `None` for anonymous callers. Never rejects.
pub struct MaybeUser(pub Option<SessionClaims>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    TokenCodec: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = TokenCodec::from_ref(state);
        Ok(MaybeUser(resolve(&parts.headers, &codec)))
    }
}

/// Authenticated caller. Rejects anonymous requests with 401 before the
/// handler (and therefore any ownership check) runs.
pub struct AuthUser(pub SessionClaims);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.user_id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenCodec: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = TokenCodec::from_ref(state);
        resolve(&parts.headers, &codec)
            .map(AuthUser)
            .ok_or_else(ApiError::unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::claims::Role, config::JwtConfig};
    use axum::http::{header, HeaderValue};

    fn codec() -> TokenCodec {
        TokenCodec::new(&JwtConfig {
            secret: "dev-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 10,
        })
    }

    #[test]
    fn resolves_cookie_identity() {
        let codec = codec();
        let claims = SessionClaims {
            user_id: Uuid::new_v4(),
            email: "a@b.io".into(),
            role: Role::Admin,
        };
        let token = codec.issue(&claims).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("authToken={token}")).unwrap(),
        );
        assert_eq!(resolve(&headers, &codec), Some(claims));
    }

    #[test]
    fn anonymous_and_garbage_look_the_same() {
        let codec = codec();
        let mut headers = HeaderMap::new();
        assert_eq!(resolve(&headers, &codec), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer garbage"));
        assert_eq!(resolve(&headers, &codec), None);
    }
}
