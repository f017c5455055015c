//! Prompt templates and token budgets for the three AI calls.

use analysis_core::{IndexLevel, MarketIndices, NewsArticle, StockQuote};

pub const TEMPERATURE: f64 = 0.7;

pub const INSIGHT_MAX_TOKENS: u32 = 150;
pub const RECOMMENDATION_MAX_TOKENS: u32 = 1000;
pub const QUERY_MAX_TOKENS: u32 = 300;

pub const MAX_CANDIDATES: usize = 20;
const HEADLINES_IN_SUMMARY: usize = 5;

pub const INSIGHT_SYSTEM: &str =
    "You are a financial analyst providing insights on stock movements.";
pub const RECOMMENDATION_SYSTEM: &str = "You are a professional financial analyst providing stock recommendations. Always respond with valid JSON.";
pub const QUERY_SYSTEM: &str = "You are a professional financial analyst providing expert advice on stocks and market strategies.";

pub const QUERY_FALLBACK: &str =
    "I'm unable to provide an analysis at this time. Please try again later.";

pub fn insight_fallback(symbol: &str) -> String {
    format!("Unable to generate insight for {} at this time.", symbol)
}

/// First `min(count * 2, 20)` constituents
pub fn select_candidates(constituents: &[String], count: usize) -> &[String] {
    let take = count.saturating_mul(2).min(MAX_CANDIDATES).min(constituents.len());
    &constituents[..take]
}

pub fn insight_prompt(quote: &StockQuote, news: &[NewsArticle]) -> String {
    format!(
        "Analyze the provided stock data and recent news to explain why the stock moved today.

Stock Data:
- Symbol: {symbol}
- Current Price: ₹{price}
- Change: ₹{change} ({change_pct:.2}%)
- Volume: {volume}
- High: ₹{high}
- Low: ₹{low}

Recent News Summary:
{summary}

Provide a concise 2-sentence explanation of why the stock moved today, focusing on key drivers from the data provided.",
        symbol = quote.symbol,
        price = quote.price,
        change = quote.change,
        change_pct = quote.change_percent,
        volume = group_thousands(quote.volume),
        high = quote.high,
        low = quote.low,
        summary = summarize_news(news),
    )
}

pub fn recommendation_prompt(candidates: &[String], indices: &MarketIndices, count: usize) -> String {
    format!(
        r#"Based on current market conditions and technical analysis, recommend the top {count} stocks from the following list for investment.

{context}

Stock List: {list}

For each recommended stock, provide:
1. Action (buy/sell/hold)
2. Short-term target (1 week) - realistic price target
3. Long-term target (3 months) - realistic price target
4. Two-line rationale integrating market context and stock fundamentals

Format your response as a JSON array with the following structure:
[
    {{
        "symbol": "STOCK_SYMBOL",
        "action": "buy/sell/hold",
        "short_term_target": price_number,
        "long_term_target": price_number,
        "rationale": "Two-line explanation"
    }}
]

Only recommend stocks with strong conviction. Focus on quality over quantity."#,
        count = count,
        context = market_context(indices),
        list = candidates.join(", "),
    )
}

pub fn query_prompt(question: &str, indices: &MarketIndices) -> String {
    format!(
        "You are a financial analyst. Based on the current market data and your expertise, answer the following question:

{context}

Question: {question}

Provide an actionable, research-grade answer. If the question is about a specific stock, provide relevant analysis.
If it's about strategy, provide general guidance. Keep the response concise but informative.",
        context = market_context(indices),
        question = question,
    )
}

pub fn market_context(indices: &MarketIndices) -> String {
    let line = |name: &str, level: &IndexLevel| {
        format!("- {}: {} ({:.2}%)", name, level.value, level.change_percent)
    };

    [
        "Current Market Context:".to_string(),
        line("Nifty 50", &indices.nifty50),
        line("Sensex", &indices.sensex),
        line("Bank Nifty", &indices.banknifty),
        line("VIX", &indices.vix),
    ]
    .join("\n")
}

fn summarize_news(news: &[NewsArticle]) -> String {
    if news.is_empty() {
        return "No recent news available.".to_string();
    }

    let headlines: Vec<&str> = news
        .iter()
        .take(HEADLINES_IN_SUMMARY)
        .map(|a| a.title.as_str())
        .collect();
    format!("Recent headlines: {}", headlines.join("; "))
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
