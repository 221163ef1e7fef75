use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;

use super::parser::{parse_rss, RssFeed};
use crate::config::AppConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: u64 = 5 * 1024 * 1024;

/// Feed fetcher with a shared HTTP client
#[derive(Clone)]
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    /// Create a new feed fetcher with configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Self::build_client(
            Duration::from_secs(config.sync.request_timeout_secs),
            &config.sync.user_agent,
        )?;

        Ok(Self { client })
    }

    /// Build HTTP client that identifies itself on every request
    fn build_client(timeout: Duration, user_agent: &str) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/rss+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        let ua = HeaderValue::from_str(user_agent)
            .map_err(|e| Error::Config(format!("Invalid user agent: {}", e)))?;
        headers.insert(USER_AGENT, ua);

        Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(Error::Http)
    }

    /// Fetch and parse a feed from URL
    pub async fn fetch(&self, url: &str) -> Result<RssFeed> {
        tracing::info!("Fetching feed from: {}", url);

        let content = self.fetch_raw(url).await?;
        let feed = parse_rss(&content, url)?;

        tracing::debug!("Feed '{}' returned {} items", feed.title, feed.items.len());

        Ok(feed)
    }

    /// Fetch the feed body without parsing it.
    ///
    /// The body is read in chunks and the read stops as soon as it grows past
    /// the size cap, whether or not the server sent a Content-Length.
    pub async fn fetch_raw(&self, url: &str) -> Result<Bytes> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(length) = response.content_length() {
            ensure_content_size(length, url)?;
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            ensure_content_size((body.len() as u64).saturating_add(chunk.len() as u64), url)?;
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }
}

fn ensure_content_size(size: u64, url: &str) -> Result<()> {
    if size > MAX_FEED_BYTES {
        return Err(Error::FeedParse {
            url: url.to_string(),
            message: format!("feed too large ({} bytes)", size),
        });
    }
    Ok(())
}
