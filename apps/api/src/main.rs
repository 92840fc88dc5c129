mod analyzer;
mod config;
mod db;
mod errors;
mod extract;
mod rank;
mod routes;
mod search;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analyzer::{DisabledAnalyzer, DocumentAnalyzer, HttpDocumentAnalyzer};
use crate::config::Config;
use crate::db::create_pool;
use crate::extract::{ExtractorRegistry, HttpPageFetcher};
use crate::rank::engine::RankingEngine;
use crate::routes::build_router;
use crate::search::aggregator::PipelineDeps;
use crate::search::cache::{spawn_purge_task, SystemClock, TtlCache};
use crate::search::provider::HttpSearchProvider;
use crate::state::AppState;
use crate::store::PgProfileStore;

/// Search request cache TTL.
const SEARCH_CACHE_HOURS: i64 = 1;
/// Per-user recommendation cache TTL.
const RECOMMENDATION_CACHE_HOURS: i64 = 24;
/// How often expired cache entries are physically evicted.
const CACHE_PURGE_INTERVAL_SECS: u64 = 15 * 60;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobScout API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Shared clock: injected so cache expiry and scoring are testable
    let clock = Arc::new(SystemClock);

    // Discovery pipeline dependencies
    let provider = Arc::new(HttpSearchProvider::new(
        config.search_api_url.clone(),
        config.search_api_key.clone(),
        config.search_engine_id.clone(),
    ));
    let pipeline = PipelineDeps {
        provider,
        fetcher: Arc::new(HttpPageFetcher::new()),
        registry: Arc::new(ExtractorRegistry::with_known_platforms()),
        cache: Arc::new(TtlCache::new(
            chrono::Duration::hours(SEARCH_CACHE_HOURS),
            clock.clone(),
        )),
        clock: clock.clone(),
    };
    info!("Search provider initialized ({})", config.search_api_url);

    // Resume analyzer: optional collaborator, ranking degrades without it
    let analyzer: Arc<dyn DocumentAnalyzer> = match &config.analyzer_url {
        Some(url) => {
            info!("Resume analyzer enabled ({url})");
            Arc::new(HttpDocumentAnalyzer::new(url.clone()))
        }
        None => {
            info!("No resume analyzer configured; ranking proceeds without resume signals");
            Arc::new(DisabledAnalyzer)
        }
    };

    // Ranking engine with its 24h per-user recommendation cache
    let recommendation_cache = Arc::new(TtlCache::new(
        chrono::Duration::hours(RECOMMENDATION_CACHE_HOURS),
        clock.clone(),
    ));
    let engine = Arc::new(RankingEngine::new(
        pipeline.clone(),
        Arc::new(PgProfileStore::new(db.clone())),
        analyzer,
        recommendation_cache.clone(),
        clock,
    ));

    // Periodic eviction keeps both caches flat over an unbounded key space
    let purge_interval = std::time::Duration::from_secs(CACHE_PURGE_INTERVAL_SECS);
    spawn_purge_task(pipeline.cache.clone(), purge_interval);
    spawn_purge_task(recommendation_cache, purge_interval);

    // Build app state
    let state = AppState { pipeline, engine };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
