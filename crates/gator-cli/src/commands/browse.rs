use anyhow::Result;

use gator_core::{
    storage::{Database, PostRepository},
    AppConfig,
};

use super::current_user;

pub async fn run(db: &Database, config: &AppConfig, limit: u32) -> Result<()> {
    let user = current_user(db, config).await?;
    let posts = PostRepository::new(db).list_for_user(user.id, limit).await?;

    if posts.is_empty() {
        println!("No posts yet.");
        println!("\nFollow a feed and let the aggregator run:");
        println!("  gator agg 1m");
        return Ok(());
    }

    for entry in &posts {
        let post = &entry.post;
        let date = post
            .published_at
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown date".to_string());

        println!("{} from {}", date, entry.feed_name);
        println!("--- {} ---", post.title);
        if let Some(description) = &post.description {
            println!("    {}", description);
        }
        println!("Link: {}", post.url);
        println!("=====================================");
    }

    Ok(())
}
