use anyhow::Result;

use gator_core::{
    storage::{Database, UserRepository},
    AppConfig, Error,
};

pub async fn register(db: &Database, config: &mut AppConfig, name: &str) -> Result<()> {
    let user = UserRepository::new(db).create(name).await?;

    config.set_current_user(&user.name);
    config.save()?;

    println!("Registered user '{}' ({})", user.name, user.id);
    println!("Logged in as {}", user.name);
    Ok(())
}

pub async fn login(db: &Database, config: &mut AppConfig, name: &str) -> Result<()> {
    let user = UserRepository::new(db)
        .find_by_name(name)
        .await?
        .ok_or_else(|| Error::UserNotFound(name.to_string()))?;

    config.set_current_user(&user.name);
    config.save()?;

    println!("Logged in as {}", user.name);
    Ok(())
}

pub async fn list(db: &Database, config: &AppConfig) -> Result<()> {
    let users = UserRepository::new(db).list_all().await?;

    if users.is_empty() {
        println!("No users yet.");
        println!("\nTo create one, run:");
        println!("  gator register <name>");
        return Ok(());
    }

    for user in &users {
        if config.current_user() == Some(user.name.as_str()) {
            println!("* {} (current)", user.name);
        } else {
            println!("* {}", user.name);
        }
    }

    Ok(())
}

pub async fn reset(db: &Database) -> Result<()> {
    let removed = UserRepository::new(db).delete_all().await?;
    println!("Database reset: removed {} users and everything they owned.", removed);
    Ok(())
}
