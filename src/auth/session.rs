use anyhow::Context;
use axum::{
    extract::FromRef,
    http::{header, HeaderMap, HeaderValue},
};

use crate::state::AppState;

pub const AUTH_COOKIE_NAME: &str = "authToken";

/// Moves the session token between client and server: an HTTP-only cookie
/// for browsers, `Authorization: Bearer` for everything else.
#[derive(Debug, Clone, Copy)]
pub struct SessionCookie {
    pub secure: bool,
    pub max_age_secs: u64,
}

impl FromRef<AppState> for SessionCookie {
    fn from_ref(state: &AppState) -> Self {
        SessionCookie {
            secure: state.config.secure_cookies,
            max_age_secs: state.tokens.ttl().as_secs(),
        }
    }
}

impl SessionCookie {
    fn header(&self, value: &str, max_age_secs: u64) -> anyhow::Result<HeaderValue> {
        let mut cookie = format!(
            "{AUTH_COOKIE_NAME}={value}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age_secs}"
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).context("session cookie is not a valid header value")
    }

    pub fn attach(&self, headers: &mut HeaderMap, token: &str) -> anyhow::Result<()> {
        headers.append(header::SET_COOKIE, self.header(token, self.max_age_secs)?);
        Ok(())
    }

    /// Expires the cookie. The token itself stays valid until its own expiry.
    pub fn clear(&self, headers: &mut HeaderMap) -> anyhow::Result<()> {
        headers.append(header::SET_COOKIE, self.header("", 0)?);
        Ok(())
    }
}

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(s) = value.to_str() else { continue };
        for part in s.split(';') {
            if let Some((k, v)) = part.trim().split_once('=') {
                if k == name && !v.is_empty() {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Cookie first, bearer header as the fallback.
pub fn extract(headers: &HeaderMap) -> Option<String> {
    parse_cookie(headers, AUTH_COOKIE_NAME).or_else(|| bearer_token(headers))
}
