//! Streaming Progress Reporter — the interactive search path as an ordered
//! tagged-event sequence over a long-lived channel.
//!
//! The producer writes into an mpsc channel; the transport layer drains it
//! and forwards server-sent events. Cancellation is simply "stop draining":
//! a failed send tells the producer the consumer went away, and the
//! remaining work for that request stops. Events already sent stay valid.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::search::acquisition::FetchMode;
use crate::search::aggregator::{self, PipelineDeps};
use crate::search::models::{JobRecord, SearchRequest};

/// Channel capacity for one streaming request. Small on purpose: a consumer
/// that stops reading applies backpressure instead of growing a buffer.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SearchEvent {
    Start {
        scope: String,
        platforms: Vec<String>,
        message: String,
    },
    Progress {
        percent: u8,
        platform: String,
        message: String,
    },
    Jobs {
        jobs: Vec<JobRecord>,
    },
    PlatformComplete {
        platform: String,
        jobs_found: usize,
        percent: u8,
    },
    Complete {
        total_jobs: usize,
    },
    Error {
        message: String,
    },
}

/// Runs the interactive pipeline for one streaming request, emitting the
/// event sequence into `tx`. Never panics into caller code: every send
/// failure is treated as consumer disconnect and ends the work quietly.
pub async fn produce(deps: PipelineDeps, request: SearchRequest, tx: mpsc::Sender<SearchEvent>) {
    let platforms = request.platform.resolve();
    let start = SearchEvent::Start {
        scope: request.platform.describe(),
        platforms: platforms.iter().map(|p| p.as_str().to_string()).collect(),
        message: format!("Searching {} platform(s)", platforms.len()),
    };
    if tx.send(start).await.is_err() {
        debug!("stream consumer disconnected before start");
        return;
    }

    match aggregator::run_search(&deps, &request, FetchMode::Interactive, Some(tx.clone())).await {
        Ok(records) => {
            let _ = tx
                .send(SearchEvent::Complete {
                    total_jobs: records.len(),
                })
                .await;
        }
        Err(err) => {
            let _ = tx
                .send(SearchEvent::Error {
                    message: err.to_string(),
                })
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::aggregator::testing::{deps_with_provider, greenhouse_item, StaticProvider};
    use crate::search::models::{LocationFilter, Platform, PlatformScope, TimeFilter};
    use std::sync::Arc;

    fn request(platform: PlatformScope) -> SearchRequest {
        SearchRequest {
            query: "rust engineer".to_string(),
            platform,
            location: LocationFilter::All,
            time: TimeFilter::Any,
            page: 1,
            limit: 20,
        }
    }

    #[test]
    fn test_event_tags_are_kebab_case() {
        let event = SearchEvent::PlatformComplete {
            platform: "greenhouse".to_string(),
            jobs_found: 3,
            percent: 50,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "platform-complete");
        assert_eq!(json["jobs_found"], 3);
    }

    #[tokio::test]
    async fn test_event_sequence_for_single_platform() {
        let provider = Arc::new(StaticProvider::new(vec![greenhouse_item(
            4012345006,
            "Senior Rust Engineer - Acme",
        )]));
        let deps = deps_with_provider(provider);
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        produce(
            deps,
            request(PlatformScope::One(Platform::Greenhouse)),
            tx,
        )
        .await;

        let mut types = Vec::new();
        while let Some(event) = rx.recv().await {
            types.push(match event {
                SearchEvent::Start { .. } => "start",
                SearchEvent::Progress { .. } => "progress",
                SearchEvent::Jobs { .. } => "jobs",
                SearchEvent::PlatformComplete { .. } => "platform-complete",
                SearchEvent::Complete { .. } => "complete",
                SearchEvent::Error { .. } => "error",
            });
        }
        assert_eq!(
            types,
            vec!["start", "progress", "jobs", "platform-complete", "complete"]
        );
    }

    #[tokio::test]
    async fn test_complete_reports_deduplicated_total() {
        let provider = Arc::new(StaticProvider::new(vec![
            greenhouse_item(4012345006, "Engineer - Acme"),
            greenhouse_item(4012345006, "Engineer - Acme"),
        ]));
        let deps = deps_with_provider(provider);
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        produce(deps, request(PlatformScope::One(Platform::Greenhouse)), tx).await;

        let mut total = None;
        while let Some(event) = rx.recv().await {
            if let SearchEvent::Complete { total_jobs } = event {
                total = Some(total_jobs);
            }
        }
        assert_eq!(total, Some(1));
    }

    #[tokio::test]
    async fn test_disconnected_consumer_stops_producer() {
        let provider = Arc::new(StaticProvider::new(vec![greenhouse_item(
            4012345006,
            "Engineer - Acme",
        )]));
        let calls = {
            let deps = deps_with_provider(provider.clone());
            let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
            drop(rx);
            // Must return quietly without panicking or touching the provider.
            produce(deps, request(PlatformScope::All), tx).await;
            provider.calls.load(std::sync::atomic::Ordering::SeqCst)
        };
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_validation_failure_emits_error_event() {
        let deps = deps_with_provider(Arc::new(StaticProvider::new(vec![])));
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let mut bad = request(PlatformScope::All);
        bad.query = "  ".to_string();
        produce(deps, bad, tx).await;

        let mut saw_error = false;
        while let Some(event) = rx.recv().await {
            if let SearchEvent::Error { .. } = event {
                saw_error = true;
            }
        }
        assert!(saw_error);
    }
}
