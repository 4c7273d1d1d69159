use uuid::Uuid;

use crate::error::ApiError;

/// A resource whose creator is recorded at creation time.
pub trait Owned {
    fn author_id(&self) -> Uuid;
}

/// Gate for update/delete. Takes a resolved user id, so anonymous callers
/// must already have been turned away by `AuthUser`. Admins get no bypass.
pub fn assert_owner<R: Owned + ?Sized>(user_id: Uuid, resource: &R) -> Result<(), ApiError> {
    if resource.author_id() == user_id {
        Ok(())
    } else {
        tracing::warn!(%user_id, owner = %resource.author_id(), "ownership check failed");
        Err(ApiError::Forbidden("Unauthorized".into()))
    }
}
