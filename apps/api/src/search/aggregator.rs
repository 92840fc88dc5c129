//! Aggregator & Deduplicator — fans the discovery pipeline out across
//! platforms, collects with per-task fault isolation, and removes exact URL
//! duplicates. One platform's total failure never aborts the batch; it
//! contributes zero records.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::extract::{self, ExtractorRegistry, PageFetcher};
use crate::search::acquisition::{self, FetchMode};
use crate::search::cache::{request_signature, Clock, TtlCache};
use crate::search::models::{
    JobRecord, LocationFilter, Platform, PlatformScope, SearchRequest, TimeFilter,
};
use crate::search::provider::SearchProvider;
use crate::search::query;
use crate::search::stream::SearchEvent;

/// Everything a pipeline run needs, bundled so callers clone one handle.
#[derive(Clone)]
pub struct PipelineDeps {
    pub provider: Arc<dyn SearchProvider>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub registry: Arc<ExtractorRegistry>,
    pub cache: Arc<TtlCache<Vec<JobRecord>>>,
    pub clock: Arc<dyn Clock>,
}

/// Runs one platform's sub-pipeline: compile → acquire → extract → validate.
/// Checks the process-wide cache by request signature before any network
/// call; a degraded (failed) provider page is never cached.
pub async fn run_platform(
    deps: &PipelineDeps,
    search_query: &str,
    platform: Platform,
    location: &LocationFilter,
    time: TimeFilter,
    page: u32,
    quota: Option<usize>,
) -> Result<Vec<JobRecord>, AppError> {
    let expression = query::compile(search_query, PlatformScope::One(platform), location)?;
    let recency = time.as_provider_param();
    let key = request_signature(&expression, page, recency);

    if let Some(cached) = deps.cache.get(&key).await {
        debug!("cache hit for {}", platform.as_str());
        return Ok(cached);
    }

    let Some(items) = acquisition::fetch_results(
        deps.provider.as_ref(),
        &expression,
        page,
        recency,
    )
    .await
    else {
        return Ok(Vec::new());
    };

    let take = quota.unwrap_or(items.len());
    let mut records = Vec::new();
    for item in items.iter().take(take) {
        if let Some(record) = extract::extract_item(
            deps.registry.as_ref(),
            deps.fetcher.as_ref(),
            item,
            None,
            deps.clock.now(),
        )
        .await
        {
            records.push(record);
        }
    }

    let records = dedup_by_url(records);
    deps.cache.insert(key, records.clone()).await;
    Ok(records)
}

/// Removes exact URL duplicates, first record wins, order preserved. No
/// fuzzy matching happens at this stage.
pub fn dedup_by_url(records: Vec<JobRecord>) -> Vec<JobRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.url.clone()))
        .collect()
}

/// Fans out over `platforms` under the given mode, optionally reporting
/// progress events. Interactive mode staggers concurrent task starts; batch
/// mode runs strictly sequentially with a longer delay.
#[allow(clippy::too_many_arguments)]
pub async fn search_platforms(
    deps: &PipelineDeps,
    search_query: &str,
    platforms: &[Platform],
    location: &LocationFilter,
    time: TimeFilter,
    page: u32,
    mode: FetchMode,
    quota: Option<usize>,
    events: Option<mpsc::Sender<SearchEvent>>,
) -> Vec<JobRecord> {
    let total = platforms.len().max(1);
    let completed = Arc::new(AtomicUsize::new(0));
    let cancelled = Arc::new(AtomicBool::new(false));

    match mode {
        FetchMode::Interactive => {
            let mut handles = Vec::with_capacity(platforms.len());
            for (index, platform) in platforms.iter().copied().enumerate() {
                let deps = deps.clone();
                let search_query = search_query.to_string();
                let location = location.clone();
                let events = events.clone();
                let completed = completed.clone();
                let cancelled = cancelled.clone();
                handles.push(tokio::spawn(async move {
                    tokio::time::sleep(mode.start_delay(index)).await;
                    run_platform_reporting(
                        &deps,
                        &search_query,
                        platform,
                        &location,
                        time,
                        page,
                        quota,
                        total,
                        &completed,
                        &cancelled,
                        &events,
                    )
                    .await
                }));
            }

            let mut collected = Vec::new();
            for handle in handles {
                match handle.await {
                    Ok(records) => collected.extend(records),
                    Err(err) => warn!("platform task failed: {err}"),
                }
            }
            collected
        }
        FetchMode::Batch => {
            let mut collected = Vec::new();
            for (index, platform) in platforms.iter().copied().enumerate() {
                if index > 0 {
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
                let records = run_platform_reporting(
                    deps,
                    search_query,
                    platform,
                    location,
                    time,
                    page,
                    quota,
                    total,
                    &completed,
                    &cancelled,
                    &events,
                )
                .await;
                collected.extend(records);
            }
            collected
        }
    }
}

/// One platform run plus its event reporting. Events for a single platform
/// are strictly ordered progress → jobs → platform-complete.
#[allow(clippy::too_many_arguments)]
async fn run_platform_reporting(
    deps: &PipelineDeps,
    search_query: &str,
    platform: Platform,
    location: &LocationFilter,
    time: TimeFilter,
    page: u32,
    quota: Option<usize>,
    total: usize,
    completed: &AtomicUsize,
    cancelled: &AtomicBool,
    events: &Option<mpsc::Sender<SearchEvent>>,
) -> Vec<JobRecord> {
    if cancelled.load(Ordering::SeqCst) {
        return Vec::new();
    }

    let percent_before = (completed.load(Ordering::SeqCst) * 100 / total) as u8;
    emit(
        events,
        cancelled,
        SearchEvent::Progress {
            percent: percent_before,
            platform: platform.as_str().to_string(),
            message: format!("Searching {}...", platform.as_str()),
        },
    )
    .await;
    if cancelled.load(Ordering::SeqCst) {
        return Vec::new();
    }

    let records = match run_platform(deps, search_query, platform, location, time, page, quota)
        .await
    {
        Ok(records) => records,
        Err(err) => {
            warn!("platform {} failed: {err}", platform.as_str());
            Vec::new()
        }
    };

    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
    let percent = (done * 100 / total) as u8;

    if !records.is_empty() {
        emit(
            events,
            cancelled,
            SearchEvent::Jobs {
                jobs: records.clone(),
            },
        )
        .await;
    }
    emit(
        events,
        cancelled,
        SearchEvent::PlatformComplete {
            platform: platform.as_str().to_string(),
            jobs_found: records.len(),
            percent,
        },
    )
    .await;

    records
}

/// Sends an event if a consumer is attached. A failed send means the
/// consumer disconnected: flag cancellation so remaining work stops.
async fn emit(
    events: &Option<mpsc::Sender<SearchEvent>>,
    cancelled: &AtomicBool,
    event: SearchEvent,
) {
    if let Some(tx) = events {
        if tx.send(event).await.is_err() {
            cancelled.store(true, Ordering::SeqCst);
        }
    }
}

/// Provider page retrieved by the search path. `request.page` paginates the
/// aggregated result set locally; letting it select the provider page as
/// well would skip records twice and make some of them unreachable.
const PROVIDER_PAGE: u32 = 1;

/// Full search path: validate, fan out, deduplicate. Pagination is the
/// caller's job, over the full returned set.
pub async fn run_search(
    deps: &PipelineDeps,
    request: &SearchRequest,
    mode: FetchMode,
    events: Option<mpsc::Sender<SearchEvent>>,
) -> Result<Vec<JobRecord>, AppError> {
    // Validation happens before any network call.
    query::compile(&request.query, request.platform, &request.location)?;

    let platforms = request.platform.resolve();
    let records = search_platforms(
        deps,
        &request.query,
        &platforms,
        &request.location,
        request.time,
        PROVIDER_PAGE,
        mode,
        None,
        events,
    )
    .await;

    Ok(dedup_by_url(records))
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::extract::testing::FixtureFetcher;
    use crate::search::cache::SystemClock;
    use crate::search::models::ProviderItem;
    use crate::search::provider::ProviderError;
    use async_trait::async_trait;
    use chrono::Duration;

    /// Provider double: canned items, call/page recording, optional
    /// per-expression failure.
    pub struct StaticProvider {
        pub items: Vec<ProviderItem>,
        pub calls: AtomicUsize,
        pub pages: std::sync::Mutex<Vec<u32>>,
        pub fail_when_contains: Option<String>,
    }

    impl StaticProvider {
        pub fn new(items: Vec<ProviderItem>) -> Self {
            Self {
                items,
                calls: AtomicUsize::new(0),
                pages: std::sync::Mutex::new(Vec::new()),
                fail_when_contains: None,
            }
        }

        pub fn failing_on(mut self, fragment: &str) -> Self {
            self.fail_when_contains = Some(fragment.to_string());
            self
        }
    }

    #[async_trait]
    impl SearchProvider for StaticProvider {
        async fn search(
            &self,
            expression: &str,
            page: u32,
            _recency: Option<&str>,
        ) -> Result<Vec<ProviderItem>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages.lock().unwrap().push(page);
            if let Some(fragment) = &self.fail_when_contains {
                if expression.contains(fragment.as_str()) {
                    return Err(ProviderError::Api {
                        status: 503,
                        message: "down".to_string(),
                    });
                }
            }
            Ok(self.items.clone())
        }
    }

    pub fn deps_with_provider(provider: Arc<dyn SearchProvider>) -> PipelineDeps {
        PipelineDeps {
            provider,
            fetcher: Arc::new(FixtureFetcher::new()),
            registry: Arc::new(ExtractorRegistry::with_known_platforms()),
            cache: Arc::new(TtlCache::new(Duration::hours(1), Arc::new(SystemClock))),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn greenhouse_item(id: u64, title: &str) -> ProviderItem {
        ProviderItem {
            link: format!("https://boards.greenhouse.io/acme/jobs/{id}"),
            title: title.to_string(),
            snippet: "Work on distributed systems.".to_string(),
        }
    }
}
