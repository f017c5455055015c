//! Composite 0-10 score from price momentum, news sentiment and volume.

use serde::{Deserialize, Serialize};

use crate::{NewsArticle, Sentiment, StockQuote, TradeAction};

const MAX_COMPONENT: f64 = 5.0;
const NEUTRAL_SENTIMENT: f64 = 2.5;
const VOLUME_UNIT: f64 = 1_000_000.0;
const MAX_VOLUME_SCORE: f64 = 2.0;
const MAX_TOTAL: f64 = 10.0;

const BUY_THRESHOLD: f64 = 7.0;
const HOLD_THRESHOLD: f64 = 4.0;

/// Individual score components and their (capped) sum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub momentum: f64,
    pub sentiment: f64,
    pub volume: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn recommendation(&self) -> TradeAction {
        recommendation_for_score(self.total)
    }
}

/// Score a quote against its recent news.
pub fn score_stock(quote: &StockQuote, news: &[NewsArticle]) -> ScoreBreakdown {
    let momentum = momentum_score(quote.change_percent);
    let sentiment = sentiment_score(news);
    let volume = volume_score(quote.volume);

    ScoreBreakdown {
        momentum,
        sentiment,
        volume,
        total: (momentum + sentiment + volume).min(MAX_TOTAL),
    }
}

/// Strictly above 7 is a buy, strictly above 4 a hold.
pub fn recommendation_for_score(score: f64) -> TradeAction {
    if score > BUY_THRESHOLD {
        TradeAction::Buy
    } else if score > HOLD_THRESHOLD {
        TradeAction::Hold
    } else {
        TradeAction::Sell
    }
}

fn momentum_score(change_percent: f64) -> f64 {
    ((change_percent + 5.0) / 2.0).clamp(0.0, MAX_COMPONENT)
}

fn sentiment_score(news: &[NewsArticle]) -> f64 {
    if news.is_empty() {
        return NEUTRAL_SENTIMENT;
    }

    let positive = news
        .iter()
        .filter(|n| n.sentiment == Sentiment::Positive)
        .count() as f64;
    let negative = news
        .iter()
        .filter(|n| n.sentiment == Sentiment::Negative)
        .count() as f64;
    let ratio = (positive - negative) / news.len() as f64;

    ((ratio + 1.0) * 2.5).clamp(0.0, MAX_COMPONENT)
}

fn volume_score(volume: u64) -> f64 {
    (volume as f64 / VOLUME_UNIT).min(MAX_VOLUME_SCORE)
}
