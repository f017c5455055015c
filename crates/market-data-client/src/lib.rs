use analysis_core::{
    AnalysisError, IndexLevel, MarketDataProvider, MarketIndices, StockQuote, SymbolMatch,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub mod constituents;
pub mod mock;

pub use constituents::index_constituents;

const DEFAULT_BASE_URL: &str = "https://apiconnect.angelbroking.com";
const SEARCH_PATH: &str = "/rest/secure/angelbroking/order/v1/searchScrip";
const QUOTE_PATH: &str = "/rest/secure/angelbroking/market/v1/quote/";

// SmartAPI index tokens
const NIFTY50_TOKEN: &str = "99926000";
const BANKNIFTY_TOKEN: &str = "99926009";
const INDIA_VIX_TOKEN: &str = "99926017";
const SENSEX_TOKEN: &str = "99919000";

/// Connection settings for the SmartAPI client
#[derive(Debug, Clone)]
pub struct AngelOneConfig {
    pub base_url: String,
    pub api_key: String,
    pub client_id: String,
    pub access_token: String,
    pub mock_mode: bool,
    pub timeout: Duration,
}

impl Default for AngelOneConfig {
    fn default() -> Self {
        let api_key = std::env::var("ANGEL_ONE_API_KEY").unwrap_or_default();
        let access_token = std::env::var("ANGEL_ONE_ACCESS_TOKEN").unwrap_or_default();
        // MARKET_DATA_MOCK is applied on top of this by the server config
        let mock_mode = api_key.is_empty() || access_token.is_empty();

        Self {
            base_url: std::env::var("ANGEL_ONE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_key,
            client_id: std::env::var("ANGEL_ONE_CLIENT_ID").unwrap_or_default(),
            access_token,
            mock_mode,
            timeout: Duration::from_secs(30),
        }
    }
}

impl AngelOneConfig {
    pub fn mock() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            client_id: String::new(),
            access_token: String::new(),
            mock_mode: true,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct AngelOneClient {
    config: AngelOneConfig,
    client: Client,
}

impl AngelOneClient {
    pub fn new(config: AngelOneConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    pub fn config(&self) -> &AngelOneConfig {
        &self.config
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("X-UserType", HeaderValue::from_static("USER"));
        headers.insert("X-SourceID", HeaderValue::from_static("WEB"));
        headers.insert("X-ClientLocalIP", HeaderValue::from_static("127.0.0.1"));
        headers.insert("X-ClientPublicIP", HeaderValue::from_static("127.0.0.1"));
        headers.insert("X-MACAddress", HeaderValue::from_static("00:00:00:00:00:00"));

        // Credentials come from the environment and may hold bytes a header can't carry
        if let Ok(v) = HeaderValue::from_str(&self.config.api_key) {
            headers.insert("X-PrivateKey", v);
        }
        if let Ok(v) = HeaderValue::from_str(&format!("Bearer {}", self.config.access_token)) {
            headers.insert(AUTHORIZATION, v);
        }

        headers
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, AnalysisError> {
        let url = format!("{}{}", self.config.base_url, path);

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(&body)
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

        let envelope: SmartApiResponse<T> = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        if !envelope.status {
            return Err(AnalysisError::ApiError(format!(
                "SmartAPI {}: {}",
                envelope.errorcode.unwrap_or_default(),
                envelope.message
            )));
        }

        envelope
            .data
            .ok_or_else(|| AnalysisError::InvalidData("SmartAPI response had no data".to_string()))
    }

    /// Search NSE scrips by symbol or name fragment
    pub async fn search_scrip(&self, query: &str) -> Result<Vec<SymbolMatch>, AnalysisError> {
        let scrips: Vec<ScripResult> = self
            .post(SEARCH_PATH, json!({ "exchange": "NSE", "searchscrip": query }))
            .await?;

        Ok(scrips
            .into_iter()
            .map(|s| SymbolMatch {
                symbol: s
                    .tradingsymbol
                    .strip_suffix("-EQ")
                    .unwrap_or(&s.tradingsymbol)
                    .to_string(),
                name: s.name.unwrap_or_else(|| s.tradingsymbol.clone()),
                exchange: s.exchange,
                token: Some(s.symboltoken),
            })
            .collect())
    }

    /// Fetch FULL-mode quotes for the given tokens, keyed by exchange
    pub async fn fetch_quotes(
        &self,
        exchange_tokens: serde_json::Value,
    ) -> Result<Vec<FetchedQuote>, AnalysisError> {
        let data: QuoteData = self
            .post(
                QUOTE_PATH,
                json!({ "mode": "FULL", "exchangeTokens": exchange_tokens }),
            )
            .await?;

        Ok(data.fetched)
    }

    /// Resolve a symbol to its NSE token and fetch its quote.
    pub async fn fetch_stock_quote(&self, symbol: &str) -> Result<Option<StockQuote>, AnalysisError> {
        let symbol = symbol.trim().to_uppercase();
        let equity_symbol = format!("{}-EQ", symbol);

        let token = self
            .search_scrip(&symbol)
            .await?
            .into_iter()
            .find(|m| m.symbol == symbol || m.symbol == equity_symbol)
            .and_then(|m| m.token);

        let Some(token) = token else {
            return Ok(None);
        };

        let quotes = self.fetch_quotes(json!({ "NSE": [token] })).await?;

        Ok(quotes.into_iter().next().map(|q| StockQuote {
            symbol: symbol.clone(),
            name: q.trading_symbol.clone(),
            price: q.ltp,
            open: q.open,
            high: q.high,
            low: q.low,
            close: q.close,
            volume: q.trade_volume.max(0.0) as u64,
            change: q.net_change,
            change_percent: q.percent_change,
            timestamp: Utc::now(),
        }))
    }

    pub async fn fetch_market_indices(&self) -> Result<MarketIndices, AnalysisError> {
        let quotes = self
            .fetch_quotes(json!({
                "NSE": [NIFTY50_TOKEN, BANKNIFTY_TOKEN, INDIA_VIX_TOKEN],
                "BSE": [SENSEX_TOKEN],
            }))
            .await?;

        let level = |token: &str| -> Result<IndexLevel, AnalysisError> {
            quotes
                .iter()
                .find(|q| q.symbol_token == token)
                .map(|q| IndexLevel {
                    value: q.ltp,
                    change: q.net_change,
                    change_percent: q.percent_change,
                })
                .ok_or_else(|| AnalysisError::InvalidData(format!("index token {} missing", token)))
        };

        Ok(MarketIndices {
            nifty50: level(NIFTY50_TOKEN)?,
            sensex: level(SENSEX_TOKEN)?,
            banknifty: level(BANKNIFTY_TOKEN)?,
            vix: level(INDIA_VIX_TOKEN)?,
        })
    }
}

#[async_trait]
impl MarketDataProvider for AngelOneClient {
    async fn search_stocks(&self, query: &str) -> Vec<SymbolMatch> {
        if self.config.mock_mode {
            return mock::search_stocks(query);
        }

        match self.search_scrip(query).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("Error searching stocks for '{}': {}", query, e);
                Vec::new()
            }
        }
    }

    async fn get_stock_quote(&self, symbol: &str) -> Option<StockQuote> {
        if self.config.mock_mode {
            return Some(mock::stock_quote(&symbol.trim().to_uppercase()));
        }

        match self.fetch_stock_quote(symbol).await {
            Ok(quote) => quote,
            Err(e) => {
                tracing::warn!("Error getting quote for {}: {}", symbol, e);
                None
            }
        }
    }

    async fn get_index_constituents(&self, index_name: &str) -> Vec<String> {
        // SmartAPI has no constituents endpoint
        index_constituents(index_name)
    }

    async fn get_market_indices(&self) -> MarketIndices {
        if self.config.mock_mode {
            return mock::market_indices();
        }

        match self.fetch_market_indices().await {
            Ok(indices) => indices,
            Err(e) => {
                tracing::warn!("Error getting market indices, using reference levels: {}", e);
                mock::market_indices()
            }
        }
    }

    fn is_mock(&self) -> bool {
        self.config.mock_mode
    }
}

// SmartAPI response types
#[derive(Debug, Deserialize)]
struct SmartApiResponse<T> {
    status: bool,
    #[serde(default)]
    message: String,
    errorcode: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ScripResult {
    exchange: String,
    tradingsymbol: String,
    symboltoken: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    fetched: Vec<FetchedQuote>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedQuote {
    pub exchange: String,
    pub trading_symbol: String,
    pub symbol_token: String,
    pub ltp: f64,
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub close: f64,
    #[serde(default)]
    pub net_change: f64,
    #[serde(default)]
    pub percent_change: f64,
    #[serde(default)]
    pub trade_volume: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_quote_normalises_symbol() {
        let client = AngelOneClient::new(AngelOneConfig::mock());
        let quote = client.get_stock_quote(" infy ").await.unwrap();
        assert_eq!(quote.symbol, "INFY");
        assert!(client.is_mock());
    }

    #[tokio::test]
    async fn test_constituents_available_in_any_mode() {
        let mut config = AngelOneConfig::mock();
        config.mock_mode = false;
        let client = AngelOneClient::new(config);
        assert_eq!(client.get_index_constituents("BANKNIFTY").await.len(), 12);
    }

    #[tokio::test]
    async fn test_unreachable_api_degrades_to_defaults() {
        let mut config = AngelOneConfig::mock();
        config.mock_mode = false;
        config.base_url = "http://127.0.0.1:9".to_string();
        config.timeout = Duration::from_secs(2);
        let client = AngelOneClient::new(config);

        assert!(client.search_stocks("TCS").await.is_empty());
        assert!(client.get_stock_quote("TCS").await.is_none());
        // indices fall back to reference levels
        let indices = client.get_market_indices().await;
        assert!(indices.sensex.value > 60_000.0);
    }

    #[test]
    fn test_quote_payload_decodes() {
        let raw = r#"{
            "status": true,
            "message": "SUCCESS",
            "errorcode": "",
            "data": {
                "fetched": [{
                    "exchange": "NSE",
                    "tradingSymbol": "SBIN-EQ",
                    "symbolToken": "3045",
                    "ltp": 568.2,
                    "open": 567.4,
                    "high": 569.35,
                    "low": 566.1,
                    "close": 567.4,
                    "netChange": 0.8,
                    "percentChange": 0.14,
                    "tradeVolume": 3556150
                }],
                "unfetched": []
            }
        }"#;
        let parsed: SmartApiResponse<QuoteData> = serde_json::from_str(raw).unwrap();
        let fetched = &parsed.data.unwrap().fetched[0];
        assert_eq!(fetched.symbol_token, "3045");
        assert_eq!(fetched.trade_volume as u64, 3_556_150);
    }
}
