//! Strict decoding of the model's recommendation reply.

use analysis_core::{StockRecommendation, TradeAction};
use serde::Deserialize;

use crate::error::{AiError, AiResult};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecommendation {
    symbol: String,
    action: String,
    short_term_target: f64,
    long_term_target: f64,
    rationale: String,
}

/// Decode a reply into at most `count` recommendations drawn from `candidates`.
///
/// The reply may be wrapped in a Markdown code fence. Anything else that is not
/// a JSON array of well-formed entries is rejected.
pub fn parse_recommendations(
    reply: &str,
    candidates: &[String],
    count: usize,
) -> AiResult<Vec<StockRecommendation>> {
    let body = strip_code_fence(reply);
    let raw: Vec<RawRecommendation> = serde_json::from_str(body)
        .map_err(|e| AiError::InvalidResponse(format!("recommendations are not valid JSON: {}", e)))?;

    let mut out = Vec::with_capacity(raw.len().min(count));
    for (i, entry) in raw.into_iter().enumerate() {
        out.push(validate(i, entry, candidates)?);
    }
    out.truncate(count);
    Ok(out)
}

fn validate(
    index: usize,
    entry: RawRecommendation,
    candidates: &[String],
) -> AiResult<StockRecommendation> {
    let invalid = |msg: String| AiError::InvalidResponse(format!("entry {}: {}", index, msg));

    let symbol = entry.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(invalid("empty symbol".to_string()));
    }
    if !candidates.iter().any(|c| c.eq_ignore_ascii_case(&symbol)) {
        return Err(invalid(format!("{} is not one of the requested stocks", symbol)));
    }

    let action: TradeAction = entry
        .action
        .parse()
        .map_err(|_| invalid(format!("unknown action '{}'", entry.action)))?;

    for (name, value) in [
        ("short_term_target", entry.short_term_target),
        ("long_term_target", entry.long_term_target),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(format!("{} must be a positive number", name)));
        }
    }

    let rationale = entry.rationale.trim();
    if rationale.is_empty() {
        return Err(invalid("empty rationale".to_string()));
    }

    Ok(StockRecommendation {
        symbol,
        action,
        short_term_target: entry.short_term_target,
        long_term_target: entry.long_term_target,
        rationale: rationale.to_string(),
    })
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string, e.g. ```json
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
