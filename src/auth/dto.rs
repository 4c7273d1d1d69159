use serde::{Deserialize, Serialize};

use super::{
    repo_types::{ProfilePatch, User},
    services::{is_valid_email, Credentials, NewRegistration},
};
use crate::error::ApiError;

fn present(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl TryFrom<RegisterRequest> for NewRegistration {
    type Error = ApiError;

    fn try_from(req: RegisterRequest) -> Result<Self, Self::Error> {
        let (Some(name), Some(email), Some(password)) =
            (present(req.name), present(req.email), present(req.password))
        else {
            return Err(ApiError::Validation("Name, email and password are required".into()));
        };
        if !is_valid_email(&email) {
            return Err(ApiError::Validation("Invalid email".into()));
        }
        Ok(NewRegistration { name, email, password })
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl TryFrom<LoginRequest> for Credentials {
    type Error = ApiError;

    fn try_from(req: LoginRequest) -> Result<Self, Self::Error> {
        match (present(req.email), present(req.password)) {
            (Some(email), Some(password)) => Ok(Credentials { email, password }),
            _ => Err(ApiError::Validation("Email and password are required".into())),
        }
    }
}

/// Request body for profile updates. Anything else the client sends
/// (role, password, ...) is dropped during deserialization.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

impl TryFrom<UpdateProfileRequest> for ProfilePatch {
    type Error = ApiError;

    fn try_from(req: UpdateProfileRequest) -> Result<Self, Self::Error> {
        if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ApiError::Validation("Name cannot be empty".into()));
        }
        Ok(ProfilePatch {
            name: req.name,
            email: req.email,
            avatar: req.avatar,
            bio: req.bio,
        })
    }
}

/// Returned by register, login and update.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: User,
}

/// `{user: null}` for anonymous callers.
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: Option<User>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}
