use std::sync::Arc;

use crate::rank::engine::RankingEngine;
use crate::search::aggregator::PipelineDeps;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Discovery pipeline dependencies: provider, page fetcher, extractor
    /// registry, request cache, clock.
    pub pipeline: PipelineDeps,
    pub engine: Arc<RankingEngine>,
}
