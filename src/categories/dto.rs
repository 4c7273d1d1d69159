use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Category;
use crate::{error::ApiError, posts::{repo::Post, services::slugify}};

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl TryFrom<CreateCategoryRequest> for Category {
    type Error = ApiError;

    fn try_from(req: CreateCategoryRequest) -> Result<Self, Self::Error> {
        let Some(name) = req.name.filter(|n| !n.trim().is_empty()) else {
            return Err(ApiError::Validation("Name is required".into()));
        };
        let slug = req
            .slug
            .map(|s| slugify(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&name));
        if slug.is_empty() {
            return Err(ApiError::Validation("Name must contain letters or digits".into()));
        }
        let now = OffsetDateTime::now_utc();
        Ok(Category {
            id: Uuid::new_v4(),
            name,
            slug,
            description: req.description,
            color: req.color,
            created_at: now,
            updated_at: now,
        })
    }
}

/// A category together with its published posts.
#[derive(Debug, Serialize)]
pub struct CategoryDetails {
    #[serde(flatten)]
    pub category: Category,
    pub posts: Vec<Post>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_derives_from_name() {
        let c = Category::try_from(CreateCategoryRequest {
            name: Some("Web Dev".into()),
            slug: None,
            description: None,
            color: Some("#ff0000".into()),
        })
        .unwrap();
        assert_eq!(c.slug, "web-dev");
        assert_eq!(c.color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn name_is_required() {
        let err = Category::try_from(CreateCategoryRequest {
            name: Some(" ".into()),
            slug: None,
            description: None,
            color: None,
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Name is required");
    }
}
