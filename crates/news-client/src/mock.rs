use analysis_core::NewsArticle;
use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

const SOURCES: &[&str] = &["Economic Times", "Business Standard", "Moneycontrol", "LiveMint"];

const STOCK_HEADLINES: &[&str] = &[
    "{} reports strong quarterly earnings, beats estimates",
    "{} announces new product launch, shares rally",
    "Analysts upgrade {} target price on positive outlook",
    "{} faces regulatory challenges, stock under pressure",
    "Institutional investors increase stake in {}",
    "{} management provides optimistic guidance for next quarter",
    "Market volatility affects {} trading volumes",
    "{} declares dividend, ex-date announced",
    "Brokerage firms maintain buy rating on {}",
    "{} stock hits 52-week high on strong fundamentals",
];

const MARKET_HEADLINES: &[&str] = &[
    "Nifty 50 closes higher on positive global cues",
    "Banking stocks lead market rally amid rate cut expectations",
    "FII inflows boost market sentiment, Sensex gains 200 points",
    "IT stocks under pressure on rupee appreciation",
    "Auto sector shows strong performance on festive demand",
    "Market volatility expected ahead of RBI policy announcement",
    "Pharma stocks rally on export order wins",
    "Energy stocks decline on crude oil price concerns",
    "Small-cap stocks outperform large-cap indices",
    "Market experts recommend defensive strategy amid global uncertainty",
];

pub fn stock_news(symbol: &str, limit: usize) -> Vec<NewsArticle> {
    let mut rng = rand::thread_rng();
    let count = limit.min(STOCK_HEADLINES.len());

    (0..count)
        .map(|i| {
            let template = STOCK_HEADLINES.choose(&mut rng).copied().unwrap_or("{}");
            let title = template.replace("{}", symbol);
            let description =
                format!("Detailed analysis of {} performance and market outlook...", symbol);

            NewsArticle {
                sentiment: sentiment_analysis::tag_article(&title, &description),
                title,
                description,
                url: format!("https://example.com/news/{}-{}", symbol.to_lowercase(), i + 1),
                source: pick_source(&mut rng),
                published_at: (Utc::now() - Duration::hours(rng.gen_range(1..=48))).to_rfc3339(),
            }
        })
        .collect()
}

pub fn market_news(limit: usize) -> Vec<NewsArticle> {
    let mut rng = rand::thread_rng();
    let count = limit.min(MARKET_HEADLINES.len());

    (0..count)
        .map(|i| {
            let title = MARKET_HEADLINES
                .choose(&mut rng)
                .copied()
                .unwrap_or_default()
                .to_string();
            let description =
                "Comprehensive market analysis and expert opinions on current trends...".to_string();

            NewsArticle {
                sentiment: sentiment_analysis::tag_article(&title, &description),
                title,
                description,
                url: format!("https://example.com/market-news/{}", i + 1),
                source: pick_source(&mut rng),
                published_at: (Utc::now() - Duration::hours(rng.gen_range(1..=24))).to_rfc3339(),
            }
        })
        .collect()
}

fn pick_source<R: Rng>(rng: &mut R) -> String {
    SOURCES.choose(rng).copied().unwrap_or("Newswire").to_string()
}
