use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Database;
use crate::feed::FeedFollow;
use crate::{Error, Result};

/// Repository for user → feed follows
pub struct FollowRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct FollowRow {
    id: String,
    user_id: String,
    feed_id: String,
    user_name: String,
    feed_name: String,
    created_at: DateTime<Utc>,
}

impl From<FollowRow> for FeedFollow {
    fn from(row: FollowRow) -> Self {
        FeedFollow {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            user_id: Uuid::parse_str(&row.user_id).unwrap_or_default(),
            feed_id: Uuid::parse_str(&row.feed_id).unwrap_or_default(),
            user_name: row.user_name,
            feed_name: row.feed_name,
            created_at: row.created_at,
        }
    }
}

const SELECT_FOLLOWS: &str = r#"
    SELECT ff.id, ff.user_id, ff.feed_id, u.name AS user_name, f.name AS feed_name, ff.created_at
    FROM feed_follows ff
    JOIN users u ON u.id = ff.user_id
    JOIN feeds f ON f.id = ff.feed_id
"#;

impl<'a> FollowRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Follow a feed; following twice is a constraint error
    pub async fn create(&self, user_id: Uuid, feed_id: Uuid) -> Result<FeedFollow> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO feed_follows (id, user_id, feed_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(feed_id.to_string())
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        let row: Option<FollowRow> = sqlx::query_as(&format!("{} WHERE ff.id = ?", SELECT_FOLLOWS))
            .bind(id.to_string())
            .fetch_optional(self.db.pool())
            .await?;

        row.map(FeedFollow::from)
            .ok_or_else(|| Error::FeedNotFound(feed_id.to_string()))
    }

    /// Feeds the user follows, by feed name
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<FeedFollow>> {
        let rows: Vec<FollowRow> = sqlx::query_as(&format!(
            "{} WHERE ff.user_id = ? ORDER BY f.name ASC",
            SELECT_FOLLOWS
        ))
        .bind(user_id.to_string())
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(FeedFollow::from).collect())
    }

    /// Remove a follow, returning whether one existed
    pub async fn delete(&self, user_id: Uuid, feed_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = ? AND feed_id = ?")
            .bind(user_id.to_string())
            .bind(feed_id.to_string())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
