//! Result acquisition — issues provider requests and degrades gracefully.
//!
//! A provider failure yields an empty page, never an error: callers must
//! treat an empty page as "try again later", not as a guaranteed absence of
//! jobs. When a compound expression fails, one minimal diagnostic probe
//! distinguishes a provider outage from a malformed compiled query. The
//! outcome is logged only, never surfaced.

use std::time::Duration;

use tracing::{debug, warn};

use crate::search::models::ProviderItem;
use crate::search::provider::SearchProvider;

/// How the aggregator schedules platform sub-queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Concurrent tasks with staggered starts; used by the interactive
    /// search path.
    Interactive,
    /// Strictly sequential with a longer fixed delay; used by background
    /// ranking runs where quota matters more than latency.
    Batch,
}

impl FetchMode {
    /// Delay before the sub-task at `index` may issue its first request.
    pub fn start_delay(&self, index: usize) -> Duration {
        match self {
            FetchMode::Interactive => Duration::from_millis(600) * index as u32,
            FetchMode::Batch => Duration::from_secs(1) * index as u32,
        }
    }
}

/// Fetches one provider page, swallowing provider failures.
///
/// `None` is the degraded empty page after a failure; callers must not cache
/// it, so the next identical request gets a fresh chance. `Some(vec![])` is a
/// genuine empty result and cacheable.
pub async fn fetch_results(
    provider: &dyn SearchProvider,
    expression: &str,
    page: u32,
    recency: Option<&str>,
) -> Option<Vec<ProviderItem>> {
    match provider.search(expression, page, recency).await {
        Ok(items) => Some(items),
        Err(err) => {
            warn!("provider request failed for {expression:?}: {err}");
            if is_compound(expression) {
                run_diagnostic_probe(provider, expression).await;
            }
            None
        }
    }
}

fn is_compound(expression: &str) -> bool {
    expression.contains("site:") || expression.contains("inurl:")
}

/// Re-issues the bare phrase from a failed compound expression. A probe that
/// succeeds points at the compiled operators; one that fails points at the
/// provider itself.
async fn run_diagnostic_probe(provider: &dyn SearchProvider, expression: &str) {
    let probe = minimal_probe(expression);
    if probe.is_empty() {
        return;
    }
    match provider.search(&probe, 1, None).await {
        Ok(_) => debug!("diagnostic probe {probe:?} succeeded; compiled expression likely malformed"),
        Err(err) => debug!("diagnostic probe {probe:?} failed as well; provider outage: {err}"),
    }
}

/// The first quoted phrase of the expression, or its first whitespace token.
fn minimal_probe(expression: &str) -> String {
    if let Some(open) = expression.find('"') {
        if let Some(close) = expression[open + 1..].find('"') {
            return expression[open..open + close + 2].to_string();
        }
    }
    expression
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::provider::ProviderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Provider double that counts calls and records the queries it saw.
    struct FailingProvider {
        calls: AtomicUsize,
        queries: Mutex<Vec<String>>,
    }

    impl FailingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for FailingProvider {
        async fn search(
            &self,
            expression: &str,
            _page: u32,
            _recency: Option<&str>,
        ) -> Result<Vec<ProviderItem>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(expression.to_string());
            Err(ProviderError::Api {
                status: 429,
                message: "quota".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_failure_returns_degraded_empty_page() {
        let provider = FailingProvider::new();
        let items = fetch_results(&provider, "\"rust\" site:jobs.lever.co", 1, None).await;
        assert!(items.is_none());
    }

    #[tokio::test]
    async fn test_compound_failure_issues_one_probe() {
        let provider = FailingProvider::new();
        fetch_results(&provider, "\"rust engineer\" site:jobs.lever.co", 1, None).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        let queries = provider.queries.lock().unwrap();
        assert_eq!(queries[1], "\"rust engineer\"");
    }

    #[tokio::test]
    async fn test_simple_failure_skips_probe() {
        let provider = FailingProvider::new();
        fetch_results(&provider, "plain query", 1, None).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_minimal_probe_extracts_phrase() {
        assert_eq!(
            minimal_probe("\"data engineer\" site:x (inurl:apply)"),
            "\"data engineer\""
        );
    }

    #[test]
    fn test_minimal_probe_falls_back_to_first_token() {
        assert_eq!(minimal_probe("devops site:x"), "devops");
    }

    #[test]
    fn test_interactive_stagger_spacing() {
        assert_eq!(
            FetchMode::Interactive.start_delay(3),
            Duration::from_millis(1800)
        );
        assert_eq!(FetchMode::Interactive.start_delay(0), Duration::ZERO);
    }

    #[test]
    fn test_batch_delay_is_sequential_seconds() {
        assert_eq!(FetchMode::Batch.start_delay(2), Duration::from_secs(2));
    }
}
