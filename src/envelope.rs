use serde::{Deserialize, Serialize};

/// `{success, data?, message?}` wrapper returned by resource endpoints.
/// Failures are rendered by [`crate::error::ApiError`].
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

impl Envelope<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Paged list: the envelope plus the paging echo.
#[derive(Debug, Serialize)]
pub struct ListEnvelope<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub skip: i64,
}

impl<T> ListEnvelope<T> {
    pub fn new(data: Vec<T>, total: i64, page: Pagination) -> Self {
        Self {
            success: true,
            data,
            total,
            limit: page.limit,
            skip: page.skip,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub skip: i64,
}
fn default_limit() -> i64 {
    10
}

impl Pagination {
    /// Negative values are clamped; a zero limit falls back to the default.
    pub fn normalized(self) -> Self {
        let limit = if self.limit <= 0 { default_limit() } else { self.limit.min(100) };
        Self {
            limit,
            skip: self.skip.max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_are_skipped() {
        let json = serde_json::to_value(Envelope::message("Post deleted successfully")).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("data").is_none());
        assert_eq!(json["message"], "Post deleted successfully");
    }

    #[test]
    fn pagination_is_clamped() {
        let p = Pagination { limit: -3, skip: -1 }.normalized();
        assert_eq!((p.limit, p.skip), (10, 0));
        let p = Pagination { limit: 5000, skip: 20 }.normalized();
        assert_eq!((p.limit, p.skip), (100, 20));
    }
}
