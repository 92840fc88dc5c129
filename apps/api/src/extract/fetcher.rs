//! Bounded-timeout page fetches for the deep extraction path. A timed-out or
//! failed fetch is a per-item failure, never a pipeline failure.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 8;
/// Client-side rendered platforms get longer before we give up.
const JS_HEAVY_TIMEOUT_SECS: u64 = 20;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; JobDiscoveryBot/1.0)";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("page returned status {0}")]
    Status(u16),
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, js_heavy: bool) -> Result<String, FetchError>;
}

pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str, js_heavy: bool) -> Result<String, FetchError> {
        let timeout = if js_heavy {
            std::time::Duration::from_secs(JS_HEAVY_TIMEOUT_SECS)
        } else {
            std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        };

        let response = self.client.get(url).timeout(timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        debug!("fetched {} bytes from {url}", body.len());
        Ok(body)
    }
}
