use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    dto::{NewPost, PostPatch},
    repo::Post,
};
use crate::auth::repo_types::User;

const WORDS_PER_MINUTE: usize = 200;

/// Lowercase, strip punctuation, hyphenate whitespace and underscores.
pub fn slugify(text: &str) -> String {
    lazy_static! {
        static ref STRIP: Regex = Regex::new(r"[^a-z0-9_\s-]").unwrap();
        static ref SEPARATORS: Regex = Regex::new(r"[\s_-]+").unwrap();
    }
    let lower = text.to_lowercase();
    let stripped = STRIP.replace_all(&lower, "");
    SEPARATORS
        .replace_all(&stripped, "-")
        .trim_matches('-')
        .to_string()
}

/// Whole minutes at 200 words per minute, never less than one.
pub fn reading_time(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as i32
}

pub fn build_post(author: &User, input: NewPost) -> Post {
    let now = OffsetDateTime::now_utc();
    let slug = input
        .slug
        .map(|s| slugify(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(&input.title));
    Post {
        id: Uuid::new_v4(),
        reading_time: reading_time(&input.content),
        title: input.title,
        slug,
        content: input.content,
        excerpt: input.excerpt,
        cover_image: input.cover_image,
        author_id: author.id,
        author_name: author.name.clone(),
        author_avatar: author.avatar.clone(),
        categories: input.categories,
        tags: input.tags,
        status: input.status,
        featured: input.featured,
        view_count: 0,
        comment_count: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Merges a patch into `post`. The author and counters are left alone.
pub fn apply_patch(post: &mut Post, patch: PostPatch) {
    if let Some(title) = patch.title {
        post.title = title;
    }
    if let Some(slug) = patch.slug {
        post.slug = slugify(&slug);
    }
    if let Some(content) = patch.content {
        post.reading_time = reading_time(&content);
        post.content = content;
    }
    if let Some(excerpt) = patch.excerpt {
        post.excerpt = Some(excerpt);
    }
    if let Some(cover_image) = patch.cover_image {
        post.cover_image = Some(cover_image);
    }
    if let Some(categories) = patch.categories {
        post.categories = categories;
    }
    if let Some(tags) = patch.tags {
        post.tags = tags;
    }
    if let Some(status) = patch.status {
        post.status = status;
    }
    if let Some(featured) = patch.featured {
        post.featured = featured;
    }
    post.updated_at = OffsetDateTime::now_utc();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::claims::Role, posts::repo::PostStatus};

    fn author() -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$stub".into(),
            avatar: Some("/ada.png".into()),
            bio: None,
            role: Role::User,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn new_post() -> NewPost {
        NewPost {
            title: "Hello, World!".into(),
            content: "one two three".into(),
            slug: None,
            excerpt: None,
            cover_image: None,
            categories: vec![],
            tags: vec![],
            status: PostStatus::Draft,
            featured: false,
        }
    }

    #[test]
    fn slugify_cleans_titles() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust_and   Axum -- 2024 "), "rust-and-axum-2024");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time(""), 1);
        assert_eq!(reading_time("word"), 1);
        assert_eq!(reading_time(&"w ".repeat(200)), 1);
        assert_eq!(reading_time(&"w ".repeat(201)), 2);
    }

    #[test]
    fn build_post_denormalizes_author() {
        let author = author();
        let post = build_post(&author, new_post());
        assert_eq!(post.author_id, author.id);
        assert_eq!(post.author_name, "Ada");
        assert_eq!(post.author_avatar.as_deref(), Some("/ada.png"));
        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.view_count, 0);
    }

    #[test]
    fn explicit_slug_wins() {
        let post = build_post(&author(), NewPost { slug: Some("My Slug".into()), ..new_post() });
        assert_eq!(post.slug, "my-slug");
    }

    #[test]
    fn patch_recomputes_reading_time_and_keeps_author() {
        let author = author();
        let mut post = build_post(&author, new_post());
        apply_patch(
            &mut post,
            PostPatch {
                content: Some("w ".repeat(450)),
                status: Some(PostStatus::Published),
                ..Default::default()
            },
        );
        assert_eq!(post.reading_time, 3);
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.author_id, author.id);
    }
}
