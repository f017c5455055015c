use async_trait::async_trait;
use crate::{MarketIndices, NewsArticle, StockQuote, SymbolMatch};

/// Source of quotes, symbol search and index data.
///
/// Implementations swallow their own transport failures and return an empty
/// or default value instead, so callers never see an error from here.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn search_stocks(&self, query: &str) -> Vec<SymbolMatch>;

    /// `None` when the symbol is unknown or the quote could not be fetched
    async fn get_stock_quote(&self, symbol: &str) -> Option<StockQuote>;

    async fn get_index_constituents(&self, index_name: &str) -> Vec<String>;

    async fn get_market_indices(&self) -> MarketIndices;

    fn is_mock(&self) -> bool;
}

/// Source of sentiment-tagged news
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn get_stock_news(&self, symbol: &str, limit: usize) -> Vec<NewsArticle>;

    async fn get_market_news(&self, limit: usize) -> Vec<NewsArticle>;
}
