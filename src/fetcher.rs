use std::ops::Deref;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use scraper::Html;

use crate::error::{ConfigError, FetchError};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// A parsed HTML page.
#[derive(Debug)]
pub struct Document(Html);

impl Document {
    /// Parse a response body. A body with no markup at all is a parse failure.
    pub fn parse(body: &str) -> Result<Self, FetchError> {
        if body.trim().is_empty() {
            return Err(FetchError::ParseFailure("empty body".to_string()));
        }
        Ok(Document(Html::parse_document(body)))
    }
}

impl Deref for Document {
    type Target = Html;

    fn deref(&self) -> &Html {
        &self.0
    }
}

/// Trait behind every page and subpage request.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Sent unchanged on every request of a run.
    pub user_agent: String,
    /// `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

/// Plain GET fetcher. No retries: failures are classified and handed back.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Document, FetchError> {
        tracing::debug!("GET {url}");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        check_status(resp.status())?;

        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to read body: {e}")))?;

        Document::parse(&body)
    }
}

fn check_status(status: StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::HttpStatus(status.as_u16()))
    }
}
