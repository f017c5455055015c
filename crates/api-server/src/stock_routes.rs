//! Stock and Market API Routes
//!
//! Symbol search, realtime quote with news and insight, index scanning and
//! market-wide data.

use ai_client::prompts;
use analysis_core::{
    score_stock, MarketIndices, NewsArticle, RankedStock, ScoreBreakdown, StockQuote, SymbolMatch,
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ApiResponse, AppError, AppState};

/// Articles fetched per stock for realtime view and scoring
const NEWS_PER_STOCK: usize = 10;
/// Constituents scored by an index scan
const SCAN_UNIVERSE: usize = 20;
const DEFAULT_SCAN_LIMIT: usize = 10;
const DEFAULT_MARKET_NEWS: usize = 20;
const MAX_MARKET_NEWS: usize = 100;
pub const DEFAULT_INDEX: &str = "Nifty50";

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct RealtimeQuery {
    pub symbol: Option<String>,
}

#[derive(Deserialize)]
pub struct ScanQuery {
    pub index: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct MarketNewsQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SymbolMatch>,
}

#[derive(Serialize)]
pub struct RealtimeResponse {
    pub stock_data: StockQuote,
    pub news: Vec<NewsArticle>,
    pub ai_insight: String,
    pub score: ScoreBreakdown,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ScanResponse {
    pub index: String,
    pub top_stocks: Vec<RankedStock>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct IndicesResponse {
    pub indices: MarketIndices,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct MarketNewsResponse {
    pub articles: Vec<NewsArticle>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stock/search", get(search_stocks))
        .route("/api/stock/realtime", get(realtime_stock))
        .route("/api/index/scan", get(scan_index))
        .route("/api/market/indices", get(market_indices))
        .route("/api/market/news", get(market_news))
}

/// Trimmed, non-empty query value
fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

async fn search_stocks(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<SearchResponse>>, AppError> {
    let Query(params) = query?;
    let q = non_empty(params.q).ok_or_else(|| AppError::bad_request("Query parameter is required"))?;

    let results = state.market_data.search_stocks(&q).await;
    Ok(Json(ApiResponse::success(SearchResponse { results })))
}

async fn realtime_stock(
    State(state): State<AppState>,
    query: Result<Query<RealtimeQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<RealtimeResponse>>, AppError> {
    let Query(params) = query?;
    let symbol = non_empty(params.symbol)
        .ok_or_else(|| AppError::bad_request("Symbol parameter is required"))?
        .to_uppercase();

    let quote = state.market_data.get_stock_quote(&symbol).await.ok_or_else(|| {
        AppError::with_status(StatusCode::NOT_FOUND, anyhow::anyhow!("Stock not found: {}", symbol))
    })?;
    let news = state.news.get_stock_news(&symbol, NEWS_PER_STOCK).await;

    let ai_insight = match state.advisor.stock_insight(&quote, &news).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Error generating stock insight for {}: {}", symbol, e);
            prompts::insight_fallback(&symbol)
        }
    };
    let score = score_stock(&quote, &news);

    Ok(Json(ApiResponse::success(RealtimeResponse {
        stock_data: quote,
        news,
        ai_insight,
        score,
        timestamp: Utc::now(),
    })))
}

/// Score the leading constituents and return the best `limit`
async fn scan_index(
    State(state): State<AppState>,
    query: Result<Query<ScanQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ScanResponse>>, AppError> {
    let Query(params) = query?;
    let index = non_empty(params.index).unwrap_or_else(|| DEFAULT_INDEX.to_string());
    let limit = params.limit.unwrap_or(DEFAULT_SCAN_LIMIT);

    let constituents = state.market_data.get_index_constituents(&index).await;

    let mut ranked = Vec::with_capacity(SCAN_UNIVERSE);
    for symbol in constituents.iter().take(SCAN_UNIVERSE) {
        let Some(quote) = state.market_data.get_stock_quote(symbol).await else {
            tracing::warn!("Skipping {} in {} scan: no quote", symbol, index);
            continue;
        };
        let news = state.news.get_stock_news(symbol, NEWS_PER_STOCK).await;
        let score = score_stock(&quote, &news);

        ranked.push(RankedStock {
            symbol: symbol.clone(),
            name: quote.name,
            price: quote.price,
            change_percent: quote.change_percent,
            score: score.total,
            recommendation: score.recommendation(),
        });
    }

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(limit);

    Ok(Json(ApiResponse::success(ScanResponse {
        index,
        top_stocks: ranked,
        timestamp: Utc::now(),
    })))
}

async fn market_indices(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<IndicesResponse>>, AppError> {
    let indices = state.market_data.get_market_indices().await;

    Ok(Json(ApiResponse::success(IndicesResponse {
        indices,
        timestamp: Utc::now(),
    })))
}

async fn market_news(
    State(state): State<AppState>,
    query: Result<Query<MarketNewsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<MarketNewsResponse>>, AppError> {
    let Query(params) = query?;
    let limit = params.limit.unwrap_or(DEFAULT_MARKET_NEWS).min(MAX_MARKET_NEWS);

    let articles = state.news.get_market_news(limit).await;

    Ok(Json(ApiResponse::success(MarketNewsResponse {
        count: articles.len(),
        articles,
        timestamp: Utc::now(),
    })))
}
