use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::database::is_unique_violation;
use super::Database;
use crate::feed::User;
use crate::{Error, Result};

/// Repository for user accounts
pub struct UserRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct UserRow {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a user; names are unique
    pub async fn create(&self, name: &str) -> Result<User> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, name, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::UserExists(name.to_string())
            } else {
                Error::Database(e)
            }
        })?;

        Ok(User {
            id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Find a user by name
    pub async fn find_by_name(&self, name: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, created_at, updated_at FROM users WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(User::from))
    }

    /// Get all users ordered by name
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, name, created_at, updated_at FROM users ORDER BY name ASC",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Delete every user, cascading to their feeds, follows and posts
    pub async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users")
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_find() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = UserRepository::new(&db);

        let created = repo.create("kahya").await.unwrap();
        let found = repo.find_by_name("kahya").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.find_by_name("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = UserRepository::new(&db);

        repo.create("kahya").await.unwrap();
        assert!(matches!(repo.create("kahya").await, Err(Error::UserExists(_))));
    }

    #[tokio::test]
    async fn test_delete_all() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = UserRepository::new(&db);

        repo.create("b").await.unwrap();
        repo.create("a").await.unwrap();
        let names: Vec<_> = repo.list_all().await.unwrap().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["a", "b"]);

        assert_eq!(repo.delete_all().await.unwrap(), 2);
        assert!(repo.list_all().await.unwrap().is_empty());
    }
}
