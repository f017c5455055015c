//! AI API Routes

use ai_client::prompts;
use analysis_core::{MarketIndices, StockRecommendation};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stock_routes::DEFAULT_INDEX;
use crate::{ApiResponse, AppError, AppState};

const DEFAULT_RECOMMENDATION_COUNT: usize = 5;

#[derive(Deserialize)]
pub struct RecommendationQuery {
    pub count: Option<usize>,
    pub index: Option<String>,
}

#[derive(Deserialize)]
pub struct AiQueryRequest {
    pub question: Option<String>,
}

#[derive(Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<StockRecommendation>,
    pub market_context: MarketIndices,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct AiQueryResponse {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ai/recommendations", get(get_recommendations))
        .route("/api/ai/query", post(ai_query))
}

/// Model recommendations for the index. Fails with 502 when the reply cannot be decoded.
async fn get_recommendations(
    State(state): State<AppState>,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<RecommendationResponse>>, AppError> {
    let Query(params) = query?;
    let count = params.count.unwrap_or(DEFAULT_RECOMMENDATION_COUNT);
    if count == 0 {
        return Err(AppError::bad_request("count must be at least 1"));
    }
    let index = params
        .index
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .unwrap_or_else(|| DEFAULT_INDEX.to_string());

    let market_context = state.market_data.get_market_indices().await;
    let constituents = state.market_data.get_index_constituents(&index).await;

    let recommendations = state
        .advisor
        .recommend(&constituents, &market_context, count)
        .await?;

    Ok(Json(ApiResponse::success(RecommendationResponse {
        recommendations,
        market_context,
        timestamp: Utc::now(),
    })))
}

async fn ai_query(
    State(state): State<AppState>,
    payload: Result<Json<AiQueryRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AiQueryResponse>>, AppError> {
    let Json(req) = payload?;
    let question = req
        .question
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::bad_request("Question is required"))?;

    let indices = state.market_data.get_market_indices().await;

    let answer = match state.advisor.answer(&question, &indices).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Error answering query: {}", e);
            prompts::QUERY_FALLBACK.to_string()
        }
    };

    Ok(Json(ApiResponse::success(AiQueryResponse {
        question,
        answer,
        timestamp: Utc::now(),
    })))
}
