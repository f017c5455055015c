use analysis_core::{AnalysisError, NewsArticle, NewsProvider};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub mod mock;

const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
const MARKET_QUERY: &str = "stock market OR NSE OR BSE OR Nifty OR Sensex";
const LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub base_url: String,
    pub api_key: String,
    pub mock_mode: bool,
    pub timeout: Duration,
}

impl Default for NewsConfig {
    fn default() -> Self {
        let api_key = std::env::var("NEWS_API_KEY").unwrap_or_default();
        // NEWS_MOCK is applied on top of this by the server config
        let mock_mode = api_key.is_empty();

        Self {
            base_url: std::env::var("NEWS_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_key,
            mock_mode,
            timeout: Duration::from_secs(30),
        }
    }
}

impl NewsConfig {
    pub fn mock() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            mock_mode: true,
            timeout: Duration::from_secs(30),
        }
    }
}

/// NewsAPI `/everything` client
#[derive(Clone)]
pub struct NewsApiClient {
    config: NewsConfig,
    client: Client,
}

impl NewsApiClient {
    pub fn new(config: NewsConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    pub fn is_mock(&self) -> bool {
        self.config.mock_mode
    }

    /// Run an `/everything` search and tag every article
    pub async fn search_everything(
        &self,
        query: &str,
        limit: usize,
        last_week_only: bool,
    ) -> Result<Vec<NewsArticle>, AnalysisError> {
        let url = format!("{}/everything", self.config.base_url);

        let mut params = vec![
            ("q", query.to_string()),
            ("language", "en".to_string()),
            ("sortBy", "publishedAt".to_string()),
            ("pageSize", limit.to_string()),
            ("apiKey", self.config.api_key.clone()),
        ];
        if last_week_only {
            let to = Utc::now();
            let from = to - ChronoDuration::days(LOOKBACK_DAYS);
            params.push(("from", from.format("%Y-%m-%d").to_string()));
            params.push(("to", to.format("%Y-%m-%d").to_string()));
        }

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body: EverythingResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(body.articles.into_iter().map(RawArticle::into_article).collect())
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn get_stock_news(&self, symbol: &str, limit: usize) -> Vec<NewsArticle> {
        if self.config.mock_mode {
            return mock::stock_news(symbol, limit);
        }

        let query = format!("{} OR \"{}\"", symbol, symbol);
        match self.search_everything(&query, limit, true).await {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!("Error fetching news for {}: {}", symbol, e);
                Vec::new()
            }
        }
    }

    async fn get_market_news(&self, limit: usize) -> Vec<NewsArticle> {
        if self.config.mock_mode {
            return mock::market_news(limit);
        }

        match self.search_everything(MARKET_QUERY, limit, false).await {
            Ok(articles) => articles,
            Err(e) => {
                tracing::warn!("Error fetching market news: {}", e);
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<RawSource>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

impl RawArticle {
    fn into_article(self) -> NewsArticle {
        let title = self.title.unwrap_or_default();
        let description = self.description.unwrap_or_default();
        let sentiment = sentiment_analysis::tag_article(&title, &description);

        NewsArticle {
            title,
            description,
            url: self.url.unwrap_or_default(),
            source: self.source.and_then(|s| s.name).unwrap_or_default(),
            published_at: self.published_at.unwrap_or_default(),
            sentiment,
        }
    }
}
