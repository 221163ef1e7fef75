use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gator_core::{scheduler::parse_interval, storage::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "gator")]
#[command(author, version, about = "A periodic RSS aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a user and log in as them
    Register {
        /// User name
        name: String,
    },
    /// Switch the current user
    Login {
        /// User name
        name: String,
    },
    /// List all users
    Users,
    /// Delete all users, feeds, follows and posts
    Reset,
    /// Add a feed and follow it
    #[command(name = "addfeed")]
    AddFeed {
        /// Display name for the feed
        name: String,
        /// RSS feed URL
        url: String,
    },
    /// List all feeds
    Feeds,
    /// Follow an existing feed
    Follow {
        /// RSS feed URL
        url: String,
    },
    /// List the feeds the current user follows
    Following,
    /// Stop following a feed
    Unfollow {
        /// RSS feed URL
        url: String,
    },
    /// Show the latest posts from followed feeds
    Browse {
        /// Number of posts to show
        #[arg(default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,
    },
    /// Poll feeds on a fixed interval until Ctrl+C
    Agg {
        /// Time between requests, e.g. 30s, 1m, 1h30m
        #[arg(value_parser = parse_interval)]
        time_between_reqs: Duration,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load()?;

    // Initialize logging; RUST_LOG takes precedence over the configured level
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Initialize database
    let db = Arc::new(Database::new(&config).await?);

    match cli.command {
        Commands::Register { name } => commands::users::register(&db, &mut config, &name).await,
        Commands::Login { name } => commands::users::login(&db, &mut config, &name).await,
        Commands::Users => commands::users::list(&db, &config).await,
        Commands::Reset => commands::users::reset(&db).await,
        Commands::AddFeed { name, url } => commands::feeds::add(&db, &config, &name, &url).await,
        Commands::Feeds => commands::feeds::list(&db).await,
        Commands::Follow { url } => commands::follow::follow(&db, &config, &url).await,
        Commands::Following => commands::follow::following(&db, &config).await,
        Commands::Unfollow { url } => commands::follow::unfollow(&db, &config, &url).await,
        Commands::Browse { limit } => commands::browse::run(&db, &config, limit).await,
        Commands::Agg { time_between_reqs } => {
            commands::agg::run(db, Arc::new(config), time_between_reqs).await
        }
    }
}
