use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::rank::scoring::Recommendation;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct RecommendationParams {
    pub user_id: String,
    pub limit: Option<usize>,
}

impl RecommendationParams {
    fn parse(&self) -> Result<(Uuid, usize), AppError> {
        let user_id = self
            .user_id
            .parse::<Uuid>()
            .map_err(|_| AppError::Validation("user_id must be a valid UUID".to_string()))?;
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        Ok((user_id, limit))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
    pub total: usize,
}

/// GET /api/v1/recommendations
pub async fn handle_recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<RecommendationsResponse>, AppError> {
    let (user_id, limit) = params.parse()?;
    let recommendations = state.engine.recommend(user_id, limit).await;
    let total = recommendations.len();
    Ok(Json(RecommendationsResponse {
        recommendations,
        total,
    }))
}

/// DELETE /api/v1/recommendations/cache
pub async fn handle_clear_cache(
    State(state): State<AppState>,
    Query(params): Query<RecommendationParams>,
) -> Result<StatusCode, AppError> {
    let (user_id, _) = params.parse()?;
    state.engine.clear_cache(user_id).await;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_uuid_is_validation_error() {
        let params = RecommendationParams {
            user_id: "not-a-uuid".to_string(),
            limit: None,
        };
        assert!(matches!(params.parse(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_limit_defaults_and_clamps() {
        let id = Uuid::new_v4().to_string();
        let default = RecommendationParams {
            user_id: id.clone(),
            limit: None,
        };
        assert_eq!(default.parse().unwrap().1, DEFAULT_LIMIT);

        let oversized = RecommendationParams {
            user_id: id,
            limit: Some(10_000),
        };
        assert_eq!(oversized.parse().unwrap().1, MAX_LIMIT);
    }
}
