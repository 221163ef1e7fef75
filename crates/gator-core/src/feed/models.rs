use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Represents a polled RSS feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub user_id: Uuid,
    /// `None` until the scheduler has polled the feed once
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A feed joined with the name of the user who added it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedWithOwner {
    pub feed: Feed,
    pub user_name: String,
}

/// Data required to create a new feed
#[derive(Debug, Clone)]
pub struct NewFeed {
    pub name: String,
    pub url: String,
    pub user_id: Uuid,
}

/// A user following a feed, joined with both names for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedFollow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub feed_id: Uuid,
    pub user_name: String,
    pub feed_name: String,
    pub created_at: DateTime<Utc>,
}

/// A single item as it appeared in the feed document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
}

/// Represents a persisted feed item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub feed_id: Uuid,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    /// `None` when the feed's pubDate could not be parsed
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub feed_id: Uuid,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// A post together with the name of the feed it came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWithFeed {
    pub post: Post,
    pub feed_name: String,
}

impl NewPost {
    /// Build a post record from a fetched item
    pub fn from_item(feed_id: Uuid, item: &FetchedItem, published_at: Option<DateTime<Utc>>) -> Self {
        let description = if item.description.is_empty() {
            None
        } else {
            Some(item.description.clone())
        };

        Self {
            feed_id,
            title: item.title.clone(),
            url: item.link.clone(),
            description,
            published_at,
        }
    }
}
