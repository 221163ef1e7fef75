pub mod date;
mod fetcher;
mod models;
mod parser;

pub use date::resolve_pub_date;
pub use fetcher::FeedFetcher;
pub use models::{Feed, FeedFollow, FeedWithOwner, FetchedItem, NewFeed, NewPost, Post, PostWithFeed, User};
pub use parser::{parse_rss, RssFeed};
