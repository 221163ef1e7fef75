use anyhow::Result;
use url::Url;

use gator_core::{
    feed::NewFeed,
    storage::{Database, FeedRepository, FollowRepository},
    AppConfig, Error,
};

use super::current_user;

pub async fn add(db: &Database, config: &AppConfig, name: &str, url: &str) -> Result<()> {
    let user = current_user(db, config).await?;

    Url::parse(url).map_err(Error::from)?;

    let feed_repo = FeedRepository::new(db);
    if feed_repo.find_by_url(url).await?.is_some() {
        println!("A feed with this URL already exists.");
        println!("\nTo follow it, run:");
        println!("  gator follow {}", url);
        return Ok(());
    }

    let feed = feed_repo
        .create(&NewFeed {
            name: name.to_string(),
            url: url.to_string(),
            user_id: user.id,
        })
        .await?;
    println!("Added feed: {} ({})", feed.name, feed.id);
    println!("  URL: {}", feed.url);

    let follow = FollowRepository::new(db).create(user.id, feed.id).await?;
    println!("{} is now following '{}'", follow.user_name, follow.feed_name);

    Ok(())
}

pub async fn list(db: &Database) -> Result<()> {
    let feeds = FeedRepository::new(db).list_with_owner().await?;

    if feeds.is_empty() {
        println!("No feeds yet.");
        println!("\nTo add a feed, run:");
        println!("  gator addfeed <name> <url>");
        return Ok(());
    }

    println!("Feeds ({}):\n", feeds.len());

    for entry in &feeds {
        println!("  {} (added by {})", entry.feed.name, entry.user_name);
        println!("    URL: {}", entry.feed.url);
        match entry.feed.last_fetched_at {
            Some(last) => println!("    Last fetched: {}", last.format("%Y-%m-%d %H:%M")),
            None => println!("    Last fetched: never"),
        }
        println!();
    }

    Ok(())
}
