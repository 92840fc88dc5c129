//! Ranking Engine — assembles a profile, re-runs the discovery pipeline for a
//! bounded set of terms in batch mode, scores and orders the candidates, and
//! caches the result per user for 24 hours.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::analyzer::DocumentAnalyzer;
use crate::rank::profile::{self, UserProfile};
use crate::rank::scoring::{self, Recommendation};
use crate::rank::terms;
use crate::search::acquisition::FetchMode;
use crate::search::aggregator::{self, PipelineDeps};
use crate::search::cache::{Clock, TtlCache};
use crate::search::models::{JobRecord, LocationFilter, PlatformScope, TimeFilter};
use crate::store::ProfileStore;

/// Hard cap on the candidate pool; bounds total scoring work per run.
const POOL_CAP: usize = 200;
/// How many top recommendations are kept in the per-user cache.
const CACHED_RECOMMENDATIONS: usize = 50;

pub struct RankingEngine {
    pipeline: PipelineDeps,
    store: Arc<dyn ProfileStore>,
    analyzer: Arc<dyn DocumentAnalyzer>,
    cache: Arc<TtlCache<Vec<Recommendation>>>,
    clock: Arc<dyn Clock>,
}

impl RankingEngine {
    pub fn new(
        pipeline: PipelineDeps,
        store: Arc<dyn ProfileStore>,
        analyzer: Arc<dyn DocumentAnalyzer>,
        cache: Arc<TtlCache<Vec<Recommendation>>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pipeline,
            store,
            analyzer,
            cache,
            clock,
        }
    }

    /// Returns up to `limit` ranked recommendations for the user. Collaborator
    /// failures degrade to missing signals; this never errors, a user with no
    /// profile at all still gets a ranked list from generic default terms.
    pub async fn recommend(&self, user_id: Uuid, limit: usize) -> Vec<Recommendation> {
        let key = user_id.to_string();
        if let Some(cached) = self.cache.get(&key).await {
            return top(cached, limit);
        }

        let profile = profile::assemble(self.store.as_ref(), self.analyzer.as_ref(), user_id).await;
        let selected = terms::select_terms(&profile);
        info!(
            "ranking run for {user_id}: {} terms, signals={}",
            selected.len(),
            profile.has_signals()
        );

        let pool = self.retrieve_candidates(&selected).await;
        let mut recommendations = self.score_pool(&pool, &profile);
        recommendations.sort_by(|a, b| b.score.cmp(&a.score));
        recommendations.truncate(CACHED_RECOMMENDATIONS);

        self.cache.insert(key, recommendations.clone()).await;
        if let Err(err) = self.store.mark_recommendations_refreshed(user_id).await {
            warn!("failed to record recommendation refresh for {user_id}: {err}");
        }

        top(recommendations, limit)
    }

    pub async fn clear_cache(&self, user_id: Uuid) {
        self.cache.remove(&user_id.to_string()).await;
    }

    /// Runs the discovery pipeline once per term, sequentially, accumulating
    /// a deduplicated pool capped at `POOL_CAP`.
    async fn retrieve_candidates(&self, selected: &[terms::SearchTerm]) -> Vec<JobRecord> {
        let platforms = PlatformScope::All.resolve();
        let mut pool: Vec<JobRecord> = Vec::new();

        for term in selected {
            if pool.len() >= POOL_CAP {
                break;
            }
            let records = aggregator::search_platforms(
                &self.pipeline,
                &term.text,
                &platforms,
                &LocationFilter::All,
                TimeFilter::Month,
                1,
                FetchMode::Batch,
                Some(term.quota),
                None,
            )
            .await;
            pool.extend(records);
        }

        let mut pool = aggregator::dedup_by_url(pool);
        pool.truncate(POOL_CAP);
        pool
    }

    /// Scores the pool, dropping exact title+company duplicates and anything
    /// similar to an already-applied title.
    fn score_pool(&self, pool: &[JobRecord], profile: &UserProfile) -> Vec<Recommendation> {
        let now = self.clock.now();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        pool.iter()
            .filter(|job| !scoring::matches_applied(job, profile))
            .filter(|job| seen.insert((job.title.to_lowercase(), job.company.to_lowercase())))
            .map(|job| scoring::score_candidate(job, profile, now))
            .collect()
    }
}

fn top(mut recommendations: Vec<Recommendation>, limit: usize) -> Vec<Recommendation> {
    recommendations.truncate(limit);
    recommendations
}
