use uuid::Uuid;

use crate::feed::{resolve_pub_date, FetchedItem, NewPost};
use crate::storage::{is_unique_violation, Database, PostRepository};
use crate::Error;

/// Result of ingesting one batch of items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Posts written to the store
    pub stored: u32,
    /// Items the store rejected
    pub skipped: u32,
}

/// Turns fetched items into posts, one insert per item
pub struct Ingestor<'a> {
    posts: PostRepository<'a>,
}

impl<'a> Ingestor<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            posts: PostRepository::new(db),
        }
    }

    /// Store every item of a batch, in delivery order.
    ///
    /// A rejected insert is logged and skipped; it never stops the batch.
    pub async fn ingest(&self, feed_id: Uuid, items: &[FetchedItem]) -> IngestReport {
        let mut report = IngestReport::default();

        for item in items {
            let published_at = resolve_pub_date(&item.pub_date);
            let new_post = NewPost::from_item(feed_id, item, published_at);

            match self.posts.create(&new_post).await {
                Ok(post) => {
                    tracing::debug!("Post '{}' created as id={}", post.title, post.id);
                    report.stored += 1;
                }
                Err(Error::Database(ref e)) if is_unique_violation(e) => {
                    tracing::debug!("Skipping already stored post: {}", item.link);
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to store post '{}': {}", item.title, e);
                    report.skipped += 1;
                }
            }
        }

        report
    }
}
