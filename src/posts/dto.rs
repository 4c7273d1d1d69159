use serde::Deserialize;
use uuid::Uuid;

use super::repo::{PostFilter, PostStatus};
use crate::{envelope::Pagination, error::ApiError};

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: Option<PostStatus>,
    pub featured: Option<bool>,
}

/// Validated post creation input.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub featured: bool,
}

impl TryFrom<CreatePostRequest> for NewPost {
    type Error = ApiError;

    fn try_from(req: CreatePostRequest) -> Result<Self, Self::Error> {
        let (Some(title), Some(content)) = (non_empty(req.title), non_empty(req.content)) else {
            return Err(ApiError::Validation("Title and content are required".into()));
        };
        Ok(NewPost {
            title,
            content,
            slug: non_empty(req.slug),
            excerpt: req.excerpt,
            cover_image: req.cover_image,
            categories: req.categories,
            tags: req.tags,
            status: req.status.unwrap_or(PostStatus::Draft),
            featured: req.featured.unwrap_or(false),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
    pub featured: Option<bool>,
}

/// Validated partial update. `authorId` has no slot.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
    pub featured: Option<bool>,
}

impl TryFrom<UpdatePostRequest> for PostPatch {
    type Error = ApiError;

    fn try_from(req: UpdatePostRequest) -> Result<Self, Self::Error> {
        let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
        if blank(&req.title) || blank(&req.content) || blank(&req.slug) {
            return Err(ApiError::Validation("Title, slug and content cannot be empty".into()));
        }
        Ok(PostPatch {
            title: req.title,
            slug: req.slug,
            content: req.content,
            excerpt: req.excerpt,
            cover_image: req.cover_image,
            categories: req.categories,
            tags: req.tags,
            status: req.status,
            featured: req.featured,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub status: Option<PostStatus>,
    pub author_id: Option<Uuid>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub featured: Option<bool>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub skip: i64,
}
fn default_limit() -> i64 {
    10
}

impl ListPostsQuery {
    pub fn filter(&self) -> PostFilter {
        PostFilter {
            status: self.status,
            author_id: self.author_id,
            category: self.category.clone(),
            tag: self.tag.clone(),
            featured: self.featured,
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
