use serde::Deserialize;
use uuid::Uuid;

use super::repo::CommentFilter;
use crate::{envelope::Pagination, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: Option<Uuid>,
    pub content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: Uuid,
    pub content: String,
}

impl TryFrom<CreateCommentRequest> for NewComment {
    type Error = ApiError;

    fn try_from(req: CreateCommentRequest) -> Result<Self, Self::Error> {
        match (req.post_id, req.content.filter(|c| !c.trim().is_empty())) {
            (Some(post_id), Some(content)) => Ok(NewComment { post_id, content }),
            _ => Err(ApiError::Validation("Post ID and content are required".into())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: Option<String>,
}

impl UpdateCommentRequest {
    pub fn into_content(self) -> Result<String, ApiError> {
        self.content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ApiError::Validation("Content is required".into()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsQuery {
    pub post_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub skip: i64,
}
fn default_limit() -> i64 {
    10
}

impl ListCommentsQuery {
    pub fn filter(&self) -> CommentFilter {
        CommentFilter {
            post_id: self.post_id,
            author_id: self.author_id,
        }
    }

    pub fn page(&self) -> Pagination {
        Pagination {
            limit: self.limit,
            skip: self.skip,
        }
        .normalized()
    }
}
