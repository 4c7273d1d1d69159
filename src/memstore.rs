//! In-process stores behind the same traits as the Postgres ones.
//! Used for `STORE_BACKEND=memory` and by the test suites.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        claims::Role,
        repo::UserStore,
        repo_types::{NewUser, ProfilePatch, User},
    },
    bookmarks::repo::{Bookmark, BookmarkStore},
    categories::repo::{Category, CategoryStore},
    comments::repo::{Comment, CommentFilter, CommentStore},
    envelope::Pagination,
    error::UniqueViolation,
    posts::repo::{Post, PostFilter, PostStore},
};

/// Newest first, ties broken by later insertion. Returns the page and the
/// pre-paging total.
fn newest_page<T: Clone>(
    rows: &[T],
    keep: impl Fn(&T) -> bool,
    created_at: impl Fn(&T) -> OffsetDateTime,
    page: Option<Pagination>,
) -> (Vec<T>, i64) {
    let mut hits: Vec<T> = rows.iter().rev().filter(|r| keep(r)).cloned().collect();
    hits.sort_by_key(|r| std::cmp::Reverse(created_at(r)));
    let total = hits.len() as i64;
    let hits = match page {
        Some(p) => hits
            .into_iter()
            .skip(p.skip.max(0) as usize)
            .take(p.limit.max(0) as usize)
            .collect(),
        None => hits,
    };
    (hits, total)
}

#[derive(Default)]
pub struct MemoryUserStore {
    rows: RwLock<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.rows.read().await.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.rows.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|u| u.email == new.email) {
            return Err(UniqueViolation("users.email").into());
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            avatar: None,
            bio: None,
            role: Role::User,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, patch: &ProfilePatch) -> anyhow::Result<Option<User>> {
        let mut rows = self.rows.write().await;
        if let Some(email) = &patch.email {
            if rows.iter().any(|u| u.id != id && &u.email == email) {
                return Err(UniqueViolation("users.email").into());
            }
        }
        let Some(user) = rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        patch.apply(user);
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.rows.read().await.clone())
    }
}

#[derive(Default)]
pub struct MemoryPostStore {
    rows: RwLock<Vec<Post>>,
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn list(&self, filter: &PostFilter, page: Option<Pagination>) -> anyhow::Result<(Vec<Post>, i64)> {
        let rows = self.rows.read().await;
        Ok(newest_page(&rows, |p| filter.matches(p), |p| p.created_at, page))
    }

    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Post>> {
        Ok(self.rows.read().await.iter().find(|p| p.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        Ok(self.rows.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, post: Post) -> anyhow::Result<Post> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|p| p.slug == post.slug) {
            return Err(UniqueViolation("posts.slug").into());
        }
        rows.push(post.clone());
        Ok(post)
    }

    async fn update(&self, post: &Post) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|p| p.slug == post.slug && p.id != post.id) {
            return Err(UniqueViolation("posts.slug").into());
        }
        let Some(row) = rows.iter_mut().find(|p| p.id == post.id) else {
            return Ok(false);
        };
        // counters and authorship are owned by the store
        let (views, comments, author) = (row.view_count, row.comment_count, row.author_id);
        *row = post.clone();
        row.view_count = views;
        row.comment_count = comments;
        row.author_id = author;
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|p| p.id != id);
        Ok(rows.len() < before)
    }

    async fn increment_views(&self, id: Uuid) -> anyhow::Result<()> {
        if let Some(p) = self.rows.write().await.iter_mut().find(|p| p.id == id) {
            p.view_count += 1;
        }
        Ok(())
    }

    async fn adjust_comment_count(&self, id: Uuid, delta: i64) -> anyhow::Result<()> {
        if let Some(p) = self.rows.write().await.iter_mut().find(|p| p.id == id) {
            p.comment_count = (p.comment_count + delta).max(0);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCategoryStore {
    rows: RwLock<Vec<Category>>,
}

#[async_trait]
impl CategoryStore for MemoryCategoryStore {
    async fn list(&self) -> anyhow::Result<Vec<Category>> {
        let mut rows = self.rows.read().await.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Category>> {
        Ok(self.rows.read().await.iter().find(|c| c.slug == slug).cloned())
    }

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Category>> {
        Ok(self.rows.read().await.iter().find(|c| c.name == name).cloned())
    }

    async fn insert(&self, category: Category) -> anyhow::Result<Category> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|c| c.name == category.name || c.slug == category.slug) {
            return Err(UniqueViolation("categories.name").into());
        }
        rows.push(category.clone());
        Ok(category)
    }
}

#[derive(Default)]
pub struct MemoryCommentStore {
    rows: RwLock<Vec<Comment>>,
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn list(&self, filter: &CommentFilter, page: Pagination) -> anyhow::Result<(Vec<Comment>, i64)> {
        let rows = self.rows.read().await;
        Ok(newest_page(&rows, |c| filter.matches(c), |c| c.created_at, Some(page)))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        Ok(self.rows.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn insert(&self, comment: Comment) -> anyhow::Result<Comment> {
        self.rows.write().await.push(comment.clone());
        Ok(comment)
    }

    async fn update_content(&self, id: Uuid, content: &str) -> anyhow::Result<Option<Comment>> {
        let mut rows = self.rows.write().await;
        let Some(c) = rows.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        c.content = content.to_string();
        c.updated_at = OffsetDateTime::now_utc();
        Ok(Some(c.clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|c| c.id != id);
        Ok(rows.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryBookmarkStore {
    rows: RwLock<Vec<Bookmark>>,
}

#[async_trait]
impl BookmarkStore for MemoryBookmarkStore {
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Bookmark>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|b| b.user_id == user_id).cloned().collect())
    }

    async fn find(&self, user_id: Uuid, post_id: Uuid) -> anyhow::Result<Option<Bookmark>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|b| b.user_id == user_id && b.post_id == post_id).cloned())
    }

    async fn insert(&self, bookmark: Bookmark) -> anyhow::Result<Bookmark> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|b| b.user_id == bookmark.user_id && b.post_id == bookmark.post_id) {
            return Err(UniqueViolation("bookmarks.user_post").into());
        }
        rows.push(bookmark.clone());
        Ok(bookmark)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|b| b.id != id);
        Ok(rows.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(post_id: Uuid, at: OffsetDateTime) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            post_id,
            post_title: "T".into(),
            post_slug: "t".into(),
            author_id: Uuid::new_v4(),
            author_name: "Ada".into(),
            author_avatar: None,
            content: "hi".into(),
            is_verified: false,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn comments_page_newest_first_and_count_the_whole_match() {
        let store = MemoryCommentStore::default();
        let post = Uuid::new_v4();
        let base = OffsetDateTime::now_utc();
        for i in 0..5 {
            store.insert(comment(post, base + time::Duration::seconds(i))).await.unwrap();
        }
        store.insert(comment(Uuid::new_v4(), base)).await.unwrap();

        let filter = CommentFilter { post_id: Some(post), ..Default::default() };
        let (page, total) = store.list(&filter, Pagination { limit: 2, skip: 1 }).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert!(page[0].created_at > page[1].created_at);
        assert_eq!(page[0].created_at, base + time::Duration::seconds(3));
    }

    #[tokio::test]
    async fn profile_update_leaves_unset_fields() {
        let users = MemoryUserStore::default();
        let user = users
            .create(NewUser { name: "Ada".into(), email: "ada@example.com".into(), password_hash: "h".into() })
            .await
            .unwrap();
        let patch = ProfilePatch { bio: Some("hello".into()), ..Default::default() };
        let updated = users.update_profile(user.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.name, "Ada");
        assert_eq!(updated.bio.as_deref(), Some("hello"));
        assert!(users.update_profile(Uuid::new_v4(), &patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn taken_email_is_a_unique_violation_on_create_and_update() {
        let users = MemoryUserStore::default();
        let new = |email: &str| NewUser { name: "Ada".into(), email: email.into(), password_hash: "h".into() };
        users.create(new("ada@example.com")).await.unwrap();
        let bob = users.create(new("bob@example.com")).await.unwrap();

        let err = users.create(new("ada@example.com")).await.unwrap_err();
        assert!(UniqueViolation::is(&err));

        let patch = ProfilePatch { email: Some("ada@example.com".into()), ..Default::default() };
        let err = users.update_profile(bob.id, &patch).await.unwrap_err();
        assert!(UniqueViolation::is(&err));

        // keeping your own email is not a conflict
        let patch = ProfilePatch { email: Some("bob@example.com".into()), ..Default::default() };
        assert!(users.update_profile(bob.id, &patch).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_bookmark_is_refused() {
        let store = MemoryBookmarkStore::default();
        let (user_id, post_id) = (Uuid::new_v4(), Uuid::new_v4());
        let mk = || Bookmark { id: Uuid::new_v4(), user_id, post_id, created_at: OffsetDateTime::now_utc() };
        store.insert(mk()).await.unwrap();
        let err = store.insert(mk()).await.unwrap_err();
        assert!(UniqueViolation::is(&err));
        assert_eq!(store.list_by_user(user_id).await.unwrap().len(), 1);
    }
}
