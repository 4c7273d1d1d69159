use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::Bookmark;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleBookmarkRequest {
    pub post_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarksQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBookmarkQuery {
    pub user_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ToggleBookmarkResponse {
    pub success: bool,
    pub message: &'static str,
    pub bookmarks: Vec<Bookmark>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBookmarkResponse {
    pub success: bool,
    pub is_bookmarked: bool,
}
