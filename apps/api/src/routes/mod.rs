pub mod health;

use axum::{
    routing::{delete, get},
    Router,
};

use crate::rank::handlers as rank_handlers;
use crate::search::handlers as search_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Discovery API
        .route("/api/v1/jobs/search", get(search_handlers::handle_search))
        .route(
            "/api/v1/jobs/search/stream",
            get(search_handlers::handle_search_stream),
        )
        // Recommendations API
        .route(
            "/api/v1/recommendations",
            get(rank_handlers::handle_recommendations),
        )
        .route(
            "/api/v1/recommendations/cache",
            delete(rank_handlers::handle_clear_cache),
        )
        .with_state(state)
}
