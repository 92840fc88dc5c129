//! Extraction Adapters — turn a search-result item, or the fetched target
//! page, into a structured `JobRecord`.

pub mod adapter;
pub mod fetcher;
pub mod heuristics;

use chrono::{DateTime, Utc};
use tracing::trace;
use url::Url;

pub use adapter::{ExtractorRegistry, PlatformAdapter};
pub use fetcher::{FetchError, HttpPageFetcher, PageFetcher};

use crate::search::models::{JobRecord, ProviderItem};

/// Two-step extraction for one provider item.
///
/// Step 1, cheap path: pattern rules against the item title/snippet; accepted
/// without a fetch only when the URL points at one specific posting.
/// Step 2, deep path: fetch the target page and run the platform's selector
/// strategy. Every reject is a silent drop.
pub async fn extract_item(
    registry: &ExtractorRegistry,
    fetcher: &dyn PageFetcher,
    item: &ProviderItem,
    base: Option<&str>,
    discovered_at: DateTime<Utc>,
) -> Option<JobRecord> {
    let url = heuristics::normalize_url(&item.link, base)?;
    let parsed = Url::parse(&url).ok()?;
    let platform = registry.platform_for(&parsed);

    if let Some(record) = heuristics::extract_from_item(item, &url, platform, discovered_at) {
        return Some(record);
    }

    let html = match fetcher.fetch(&url, platform.is_js_heavy()).await {
        Ok(html) => html,
        Err(err) => {
            trace!("page fetch failed for {url}: {err}");
            return None;
        }
    };

    registry
        .adapter_for(&parsed)
        .extract(&html, &parsed, discovered_at)
}
