mod database;
mod feed_repo;
mod follow_repo;
mod post_repo;
mod user_repo;

pub use database::{is_unique_violation, Database};
pub use feed_repo::FeedRepository;
pub use follow_repo::FollowRepository;
pub use post_repo::PostRepository;
pub use user_repo::UserRepository;
