use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::Stream;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};

use crate::errors::AppError;
use crate::search::acquisition::FetchMode;
use crate::search::aggregator;
use crate::search::models::{
    JobRecord, LocationFilter, Pagination, PlatformScope, SearchRequest, SearchResponse,
    TimeFilter,
};
use crate::search::stream::{self, EVENT_CHANNEL_CAPACITY};
use crate::state::AppState;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

/// Raw query parameters. Parsed into a `SearchRequest` so malformed filter
/// values surface as structured validation errors, not framework rejections.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub platform: Option<String>,
    pub location: Option<String>,
    pub time: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<usize>,
}

impl SearchParams {
    pub fn into_request(self) -> Result<SearchRequest, AppError> {
        let platform = match self.platform.as_deref() {
            None => PlatformScope::All,
            Some(raw) => raw.parse::<PlatformScope>().map_err(AppError::Validation)?,
        };
        let location = match self.location.as_deref() {
            None => LocationFilter::All,
            Some(raw) => raw.parse::<LocationFilter>().map_err(AppError::Validation)?,
        };
        let time = match self.time.as_deref() {
            None => TimeFilter::Any,
            Some(raw) => raw.parse::<TimeFilter>().map_err(AppError::Validation)?,
        };
        let query = self.query.trim().to_string();
        if query.is_empty() {
            return Err(AppError::Validation(
                "search query must not be empty".to_string(),
            ));
        }

        Ok(SearchRequest {
            query,
            platform,
            location,
            time,
            page: self.page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        })
    }
}

/// GET /api/v1/jobs/search
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let request = params.into_request()?;
    let records =
        aggregator::run_search(&state.pipeline, &request, FetchMode::Interactive, None).await?;
    Ok(Json(paginate(records, request.page, request.limit)))
}

/// GET /api/v1/jobs/search/stream
///
/// Same input as `handle_search`, but emits the progress event sequence over
/// a persistent SSE connection instead of a single blocking response.
pub async fn handle_search_stream(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let request = params.into_request()?;
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    tokio::spawn(stream::produce(state.pipeline.clone(), request, tx));

    let events = ReceiverStream::new(rx).map(|event| {
        let sse = Event::default()
            .json_data(&event)
            .unwrap_or_else(|_| Event::default().data("{}"));
        Ok::<_, Infallible>(sse)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Slices the aggregated record list into the requested page and wraps it in
/// the pagination envelope.
pub fn paginate(records: Vec<JobRecord>, page: u32, limit: usize) -> SearchResponse {
    let total_jobs = records.len();
    let total_pages = (total_jobs.div_ceil(limit)).max(1) as u32;
    let page = page.min(total_pages);
    let offset = (page as usize - 1) * limit;

    let jobs: Vec<JobRecord> = records.into_iter().skip(offset).take(limit).collect();

    SearchResponse {
        jobs,
        pagination: Pagination {
            current_page: page,
            total_pages,
            total_jobs,
            page_size: limit,
            has_next: page < total_pages,
            has_prev: page > 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::models::Platform;
    use chrono::Utc;

    fn records(n: usize) -> Vec<JobRecord> {
        (0..n)
            .map(|i| JobRecord {
                title: format!("Engineer {i}"),
                company: "Acme".to_string(),
                location: None,
                description: None,
                url: format!("https://a/{i}"),
                logo: None,
                source: Platform::Greenhouse,
                tags: vec![],
                posted_at: None,
                discovered_at: Utc::now(),
            })
            .collect()
    }

    fn params(query: &str) -> SearchParams {
        SearchParams {
            query: query.to_string(),
            platform: None,
            location: None,
            time: None,
            page: None,
            limit: None,
        }
    }

    #[test]
    fn test_empty_query_is_validation_error() {
        assert!(matches!(
            params("  ").into_request(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_malformed_platform_is_validation_error() {
        let mut p = params("rust");
        p.platform = Some("monster".to_string());
        assert!(matches!(p.into_request(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_defaults_applied() {
        let request = params("rust").into_request().unwrap();
        assert_eq!(request.platform, PlatformScope::All);
        assert_eq!(request.page, DEFAULT_PAGE);
        assert_eq!(request.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_limit_clamped() {
        let mut p = params("rust");
        p.limit = Some(10_000);
        assert_eq!(p.into_request().unwrap().limit, MAX_LIMIT);
    }

    #[test]
    fn test_paginate_empty_result() {
        let response = paginate(vec![], 1, 20);
        assert_eq!(response.pagination.total_jobs, 0);
        assert_eq!(response.pagination.total_pages, 1);
        assert!(!response.pagination.has_next);
        assert!(!response.pagination.has_prev);
        assert!(response.jobs.is_empty());
    }

    #[test]
    fn test_paginate_splits_pages() {
        let response = paginate(records(45), 2, 20);
        assert_eq!(response.jobs.len(), 20);
        assert_eq!(response.jobs[0].url, "https://a/20");
        assert_eq!(response.pagination.total_pages, 3);
        assert!(response.pagination.has_next);
        assert!(response.pagination.has_prev);
    }

    #[test]
    fn test_paginate_clamps_page_overflow() {
        let response = paginate(records(5), 9, 20);
        assert_eq!(response.pagination.current_page, 1);
        assert_eq!(response.jobs.len(), 5);
    }
}
