use anyhow::Result;

use gator_core::{
    storage::{is_unique_violation, Database, FeedRepository, FollowRepository},
    AppConfig, Error,
};

use super::current_user;

pub async fn follow(db: &Database, config: &AppConfig, url: &str) -> Result<()> {
    let user = current_user(db, config).await?;
    let feed = FeedRepository::new(db)
        .find_by_url(url)
        .await?
        .ok_or_else(|| Error::FeedNotFound(url.to_string()))?;

    match FollowRepository::new(db).create(user.id, feed.id).await {
        Ok(follow) => {
            println!("{} is now following '{}'", follow.user_name, follow.feed_name);
            Ok(())
        }
        Err(Error::Database(ref e)) if is_unique_violation(e) => {
            println!("Already following '{}'.", feed.name);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn following(db: &Database, config: &AppConfig) -> Result<()> {
    let user = current_user(db, config).await?;
    let follows = FollowRepository::new(db).list_for_user(user.id).await?;

    if follows.is_empty() {
        println!("{} is not following any feeds.", user.name);
        return Ok(());
    }

    println!("{} follows ({}):", user.name, follows.len());
    for follow in &follows {
        println!("  * {}", follow.feed_name);
    }

    Ok(())
}

pub async fn unfollow(db: &Database, config: &AppConfig, url: &str) -> Result<()> {
    let user = current_user(db, config).await?;
    let feed = FeedRepository::new(db)
        .find_by_url(url)
        .await?
        .ok_or_else(|| Error::FeedNotFound(url.to_string()))?;

    if FollowRepository::new(db).delete(user.id, feed.id).await? {
        println!("{} unfollowed '{}'", user.name, feed.name);
    } else {
        println!("{} was not following '{}'.", user.name, feed.name);
    }

    Ok(())
}
