use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} for URL: {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to parse feed from {url}: {message}")]
    FeedParse { url: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid interval '{input}': {reason}")]
    InvalidInterval { input: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Feed not found: {0}")]
    FeedNotFound(String),

    #[error("Not logged in: run `gator login <name>` first")]
    NotLoggedIn,
}

pub type Result<T> = std::result::Result<T, Error>;
