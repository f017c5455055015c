use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AnalysisError;

/// Full quote for a single equity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub change: f64,
    pub change_percent: f64,
    pub timestamp: DateTime<Utc>,
}

/// Result row from a broker symbol search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Lexical sentiment label attached to a news article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// News article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: String,
    pub published_at: String,
    pub sentiment: Sentiment,
}

/// Level of a single market index
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexLevel {
    pub value: f64,
    pub change: f64,
    pub change_percent: f64,
}

/// Headline index levels used as market context
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketIndices {
    pub nifty50: IndexLevel,
    pub sensex: IndexLevel,
    pub banknifty: IndexLevel,
    pub vix: IndexLevel,
}

/// Buy / hold / sell label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Hold,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Hold => "hold",
            TradeAction::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeAction {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(TradeAction::Buy),
            "hold" => Ok(TradeAction::Hold),
            "sell" => Ok(TradeAction::Sell),
            other => Err(AnalysisError::InvalidData(format!(
                "unknown action '{}'",
                other
            ))),
        }
    }
}

/// Model-generated recommendation for one stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecommendation {
    pub symbol: String,
    pub action: TradeAction,
    pub short_term_target: f64,
    pub long_term_target: f64,
    pub rationale: String,
}

/// A scored index constituent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedStock {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_percent: f64,
    pub score: f64,
    pub recommendation: TradeAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_action_from_str() {
        assert_eq!("BUY".parse::<TradeAction>().unwrap(), TradeAction::Buy);
        assert_eq!(" hold ".parse::<TradeAction>().unwrap(), TradeAction::Hold);
        assert!("strong buy".parse::<TradeAction>().is_err());
    }

    #[test]
    fn test_sentiment_serializes_lowercase() {
        let json = serde_json::to_string(&Sentiment::Positive).unwrap();
        assert_eq!(json, "\"positive\"");
    }

    #[test]
    fn test_symbol_match_omits_missing_token() {
        let m = SymbolMatch {
            symbol: "TCS".to_string(),
            name: "Tata Consultancy Services Ltd".to_string(),
            exchange: "NSE".to_string(),
            token: None,
        };
        let value = serde_json::to_value(&m).unwrap();
        assert!(value.get("token").is_none());
    }
}
