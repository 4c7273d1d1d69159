use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        password::{hash_password_blocking, verify_dummy_blocking, verify_password_blocking},
        repo::UserStore,
        repo_types::{NewUser, ProfilePatch, User},
    },
    error::{ApiError, UniqueViolation},
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("User already exists with this email")]
    DuplicateEmail,
    /// Same error for unknown email and wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => ApiError::Validation(msg),
            AuthError::DuplicateEmail => ApiError::Conflict(e.to_string()),
            AuthError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            AuthError::NotFound => ApiError::NotFound(e.to_string()),
            AuthError::Store(inner) => ApiError::Internal(inner),
        }
    }
}

impl AuthError {
    /// The email checks read before they write, so a racing request can
    /// still lose at the unique constraint.
    fn from_write(e: anyhow::Error) -> Self {
        if UniqueViolation::is(&e) {
            AuthError::DuplicateEmail
        } else {
            AuthError::Store(e)
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Validated login input.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub async fn register(users: &dyn UserStore, input: NewRegistration) -> Result<User, AuthError> {
    if users.find_by_email(&input.email).await?.is_some() {
        warn!(email = %input.email, "email already registered");
        return Err(AuthError::DuplicateEmail);
    }

    let password_hash = hash_password_blocking(input.password).await?;
    let user = users
        .create(NewUser {
            name: input.name,
            email: input.email,
            password_hash,
        })
        .await
        .map_err(AuthError::from_write)?;

    info!(user_id = %user.id, "user registered");
    Ok(user)
}

pub async fn authenticate(users: &dyn UserStore, creds: Credentials) -> Result<User, AuthError> {
    let Some(user) = users.find_by_email(&creds.email).await? else {
        warn!(email = %creds.email, "login unknown email");
        verify_dummy_blocking(creds.password).await;
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password_blocking(creds.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

pub async fn update_profile(
    users: &dyn UserStore,
    user_id: Uuid,
    patch: ProfilePatch,
) -> Result<User, AuthError> {
    if patch.is_empty() {
        return Err(AuthError::Validation("Failed to update profile".into()));
    }
    if let Some(email) = &patch.email {
        if !is_valid_email(email) {
            return Err(AuthError::Validation("Invalid email".into()));
        }
        if let Some(other) = users.find_by_email(email).await? {
            if other.id != user_id {
                return Err(AuthError::DuplicateEmail);
            }
        }
    }

    let user = users
        .update_profile(user_id, &patch)
        .await
        .map_err(AuthError::from_write)?
        .ok_or(AuthError::NotFound)?;
    info!(%user_id, "profile updated");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::claims::Role, memstore::MemoryUserStore};

    fn registration(email: &str) -> NewRegistration {
        NewRegistration {
            name: "Ada".into(),
            email: email.into(),
            password: "hunter22".into(),
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example.com"));
    }

    #[tokio::test]
    async fn register_stores_a_hash_not_the_password() {
        let users = MemoryUserStore::default();
        let user = register(&users, registration("ada@example.com")).await.unwrap();
        assert_ne!(user.password_hash, "hunter22");
        assert!(user.password_hash.starts_with("$argon2"));
        assert_eq!(user.role, Role::User);
        assert!(!user.is_verified);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_a_new_record() {
        let users = MemoryUserStore::default();
        register(&users, registration("ada@example.com")).await.unwrap();
        let err = register(&users, registration("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
        assert_eq!(users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn email_match_is_case_sensitive() {
        let users = MemoryUserStore::default();
        register(&users, registration("ada@example.com")).await.unwrap();
        register(&users, registration("Ada@example.com")).await.unwrap();
        assert_eq!(users.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn bad_password_and_unknown_email_fail_identically() {
        let users = MemoryUserStore::default();
        register(&users, registration("ada@example.com")).await.unwrap();

        let wrong = authenticate(
            &users,
            Credentials {
                email: "ada@example.com".into(),
                password: "nope".into(),
            },
        )
        .await
        .unwrap_err();
        let unknown = authenticate(
            &users,
            Credentials {
                email: "bob@example.com".into(),
                password: "hunter22".into(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_registrations_yield_one_user_and_duplicate_errors() {
        let users = std::sync::Arc::new(MemoryUserStore::default());
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let users = users.clone();
            tasks.spawn(async move { register(users.as_ref(), registration("ada@example.com")).await });
        }

        let (mut created, mut duplicates) = (0, 0);
        while let Some(res) = tasks.join_next().await {
            match res.unwrap() {
                Ok(_) => created += 1,
                Err(AuthError::DuplicateEmail) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!((created, duplicates), (1, 7));
        assert_eq!(users.list().await.unwrap().len(), 1);
    }

    #[test]
    fn unique_violation_on_write_is_a_duplicate_email() {
        let err = AuthError::from_write(UniqueViolation("users.email").into());
        assert!(matches!(err, AuthError::DuplicateEmail));
        let err = AuthError::from_write(anyhow::anyhow!("pool timed out"));
        assert!(matches!(err, AuthError::Store(_)));
    }

    #[tokio::test]
    async fn authenticate_returns_the_user() {
        let users = MemoryUserStore::default();
        let created = register(&users, registration("ada@example.com")).await.unwrap();
        let user = authenticate(
            &users,
            Credentials {
                email: "ada@example.com".into(),
                password: "hunter22".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(user.id, created.id);
    }

    #[tokio::test]
    async fn update_profile_merges_fields() {
        let users = MemoryUserStore::default();
        let user = register(&users, registration("ada@example.com")).await.unwrap();
        let updated = update_profile(
            &users,
            user.id,
            ProfilePatch {
                bio: Some("Analyst".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Analyst"));
        assert_eq!(updated.name, "Ada");
        assert_eq!(updated.role, Role::User);
        assert_eq!(updated.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn update_profile_rejects_empty_and_taken_email() {
        let users = MemoryUserStore::default();
        let ada = register(&users, registration("ada@example.com")).await.unwrap();
        register(&users, registration("bob@example.com")).await.unwrap();

        let err = update_profile(&users, ada.id, ProfilePatch::default()).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        let err = update_profile(
            &users,
            ada.id,
            ProfilePatch {
                email: Some("bob@example.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }
}
