use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Database;
use crate::feed::{NewPost, Post, PostWithFeed};
use crate::Result;

/// Repository for posts ingested from feeds
pub struct PostRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct PostRow {
    id: String,
    feed_id: String,
    title: String,
    url: String,
    description: Option<String>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct PostFeedRow {
    #[sqlx(flatten)]
    post: PostRow,
    feed_name: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            feed_id: Uuid::parse_str(&row.feed_id).unwrap_or_default(),
            title: row.title,
            url: row.url,
            description: row.description,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl<'a> PostRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a post.
    ///
    /// There is no duplicate check here: a post whose URL is already stored
    /// fails on the `posts.url` unique constraint and the error is returned.
    pub async fn create(&self, new_post: &NewPost) -> Result<Post> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO posts
            (id, feed_id, title, url, description, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(new_post.feed_id.to_string())
        .bind(&new_post.title)
        .bind(&new_post.url)
        .bind(&new_post.description)
        .bind(new_post.published_at)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        Ok(Post {
            id,
            feed_id: new_post.feed_id,
            title: new_post.title.clone(),
            url: new_post.url.clone(),
            description: new_post.description.clone(),
            published_at: new_post.published_at,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get posts for a feed in insertion order
    pub async fn list_by_feed(&self, feed_id: Uuid) -> Result<Vec<Post>> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, feed_id, title, url, description, published_at, created_at, updated_at
            FROM posts
            WHERE feed_id = ?
            ORDER BY rowid ASC
            "#,
        )
        .bind(feed_id.to_string())
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    /// Latest posts from the feeds a user follows
    pub async fn list_for_user(&self, user_id: Uuid, limit: u32) -> Result<Vec<PostWithFeed>> {
        let rows: Vec<PostFeedRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.feed_id, p.title, p.url, p.description, p.published_at,
                   p.created_at, p.updated_at, f.name AS feed_name
            FROM posts p
            JOIN feeds f ON f.id = p.feed_id
            JOIN feed_follows ff ON ff.feed_id = p.feed_id
            WHERE ff.user_id = ?
            ORDER BY p.published_at DESC NULLS LAST, p.created_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(limit as i64)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PostWithFeed {
                post: Post::from(row.post),
                feed_name: row.feed_name,
            })
            .collect())
    }

    /// Count posts stored for a feed
    pub async fn count_by_feed(&self, feed_id: Uuid) -> Result<u32> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE feed_id = ?")
            .bind(feed_id.to_string())
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0 as u32)
    }
}
