//! Canned market data used when the client runs in mock mode.

use analysis_core::{IndexLevel, MarketIndices, StockQuote, SymbolMatch};
use chrono::Utc;
use rand::Rng;

const SEARCH_TABLE: &[(&str, &str)] = &[
    ("RELIANCE", "Reliance Industries Ltd"),
    ("TCS", "Tata Consultancy Services Ltd"),
    ("HDFCBANK", "HDFC Bank Ltd"),
    ("INFY", "Infosys Ltd"),
    ("ICICIBANK", "ICICI Bank Ltd"),
];

const BASE_PRICES: &[(&str, f64)] = &[
    ("RELIANCE", 2500.0),
    ("TCS", 3200.0),
    ("HDFCBANK", 1600.0),
    ("INFY", 1400.0),
    ("ICICIBANK", 900.0),
    ("WIPRO", 400.0),
    ("LT", 2000.0),
    ("SBIN", 500.0),
    ("BHARTIARTL", 800.0),
    ("ITC", 450.0),
];

const DEFAULT_BASE_PRICE: f64 = 1000.0;

pub fn search_stocks(query: &str) -> Vec<SymbolMatch> {
    let needle = query.trim().to_uppercase();

    SEARCH_TABLE
        .iter()
        .filter(|(symbol, name)| symbol.contains(&needle) || name.to_uppercase().contains(&needle))
        .map(|(symbol, name)| SymbolMatch {
            symbol: symbol.to_string(),
            name: name.to_string(),
            exchange: "NSE".to_string(),
            token: None,
        })
        .collect()
}

pub fn base_price(symbol: &str) -> f64 {
    BASE_PRICES
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, p)| *p)
        .unwrap_or(DEFAULT_BASE_PRICE)
}

pub fn stock_quote(symbol: &str) -> StockQuote {
    let mut rng = rand::thread_rng();
    let base = base_price(symbol);
    let current = base + rng.gen_range(-50.0..50.0);
    let change = current - base;

    StockQuote {
        symbol: symbol.to_string(),
        name: format!("{} Ltd", symbol),
        price: round2(current),
        open: round2(base + rng.gen_range(-20.0..20.0)),
        high: round2(current + rng.gen_range(0.0..30.0)),
        low: round2(current - rng.gen_range(0.0..30.0)),
        close: round2(current),
        volume: rng.gen_range(100_000..10_000_000),
        change: round2(change),
        change_percent: round2(change / base * 100.0),
        timestamp: Utc::now(),
    }
}

pub fn market_indices() -> MarketIndices {
    let mut rng = rand::thread_rng();
    let mut level = |value: f64, spread: f64, change: f64, change_pct: f64| IndexLevel {
        value: round2(value + rng.gen_range(-spread..spread)),
        change: round2(rng.gen_range(-change..change)),
        change_percent: round2(rng.gen_range(-change_pct..change_pct)),
    };

    MarketIndices {
        nifty50: level(19_500.0, 200.0, 100.0, 1.0),
        sensex: level(65_000.0, 500.0, 300.0, 1.0),
        banknifty: level(44_000.0, 400.0, 200.0, 1.0),
        vix: level(15.0, 3.0, 1.0, 5.0),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
