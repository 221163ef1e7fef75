pub mod agg;
pub mod browse;
pub mod feeds;
pub mod follow;
pub mod users;

use gator_core::{
    feed::User,
    storage::{Database, UserRepository},
    AppConfig, Error,
};

/// Resolve the logged-in user for commands that act on their behalf
pub async fn current_user(db: &Database, config: &AppConfig) -> gator_core::Result<User> {
    let name = config.current_user().ok_or(Error::NotLoggedIn)?;

    UserRepository::new(db)
        .find_by_name(name)
        .await?
        .ok_or_else(|| Error::UserNotFound(name.to_string()))
}
