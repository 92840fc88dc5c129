/// Search provider client — the single point of entry for all external
/// web-search calls.
///
/// The provider contract is small: a compiled expression plus a page offset
/// and an optional recency parameter, returning an ordered list of
/// {link, title, snippet}. Provider failures never propagate as pipeline
/// failures; callers degrade to an empty page (see `acquisition`).
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::search::models::ProviderItem;

/// Fixed provider page size. One paginated request per page.
pub const PAGE_SIZE: u32 = 10;

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed provider response: {0}")]
    Parse(#[from] serde_json::Error),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        expression: &str,
        page: u32,
        recency: Option<&str>,
    ) -> Result<Vec<ProviderItem>, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    #[serde(default)]
    items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    link: String,
    title: String,
    #[serde(default)]
    snippet: String,
}

/// HTTP implementation against a Custom Search-style JSON API.
#[derive(Clone)]
pub struct HttpSearchProvider {
    client: Client,
    base_url: String,
    api_key: String,
    engine_id: String,
}

impl HttpSearchProvider {
    pub fn new(base_url: String, api_key: String, engine_id: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            api_key,
            engine_id,
        }
    }
}

#[async_trait]
impl SearchProvider for HttpSearchProvider {
    async fn search(
        &self,
        expression: &str,
        page: u32,
        recency: Option<&str>,
    ) -> Result<Vec<ProviderItem>, ProviderError> {
        // The provider's offset is 1-based over items, not pages.
        let start = (page.saturating_sub(1) * PAGE_SIZE + 1).to_string();
        let num = PAGE_SIZE.to_string();

        let mut params = vec![
            ("key", self.api_key.as_str()),
            ("cx", self.engine_id.as_str()),
            ("q", expression),
            ("num", num.as_str()),
            ("start", start.as_str()),
        ];
        if let Some(recency) = recency {
            params.push(("dateRestrict", recency));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: ProviderResponse = serde_json::from_str(&body)?;

        debug!(
            "provider returned {} items for page {page}",
            parsed.items.len()
        );

        Ok(parsed
            .items
            .into_iter()
            .map(|item| ProviderItem {
                link: item.link,
                title: item.title,
                snippet: item.snippet,
            })
            .collect())
    }
}
