use chrono::Utc;

use super::ingest::{IngestReport, Ingestor};
use crate::feed::{Feed, FeedFetcher};
use crate::storage::{Database, FeedRepository};
use crate::Result;

/// What one poll cycle did
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// No feeds are registered
    Idle,
    /// A feed was fetched and its items handed to the ingestor
    Ingested { feed: Feed, report: IngestReport },
}

/// Poll the feed that has waited longest and store its items.
///
/// The feed is marked as fetched before the request goes out, so a feed that
/// keeps failing still moves to the back of the queue.
pub async fn scrape_next_feed(db: &Database, fetcher: &FeedFetcher) -> Result<CycleOutcome> {
    let feed_repo = FeedRepository::new(db);

    let Some(feed) = feed_repo.next_to_fetch().await? else {
        return Ok(CycleOutcome::Idle);
    };

    feed_repo.mark_fetched(feed.id, Utc::now()).await?;

    tracing::info!("Refreshing feed: {}", feed.name);

    let fetched = fetcher.fetch(&feed.url).await?;

    let report = Ingestor::new(db).ingest(feed.id, &fetched.items).await;

    tracing::info!(
        "Feed '{}': {} new posts, {} skipped",
        feed.name,
        report.stored,
        report.skipped
    );

    Ok(CycleOutcome::Ingested { feed, report })
}
