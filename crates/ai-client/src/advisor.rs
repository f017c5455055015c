use analysis_core::{MarketIndices, NewsArticle, StockQuote, StockRecommendation};
use async_trait::async_trait;

use crate::client::ChatCompletionClient;
use crate::error::AiResult;
use crate::prompts;
use crate::recommendations::parse_recommendations;

/// The three AI capabilities the dashboard exposes.
///
/// Callers decide how to degrade: insight and Q&A have user-facing fallback
/// text in [`prompts`], recommendations fail closed.
#[async_trait]
pub trait MarketAdvisor: Send + Sync {
    /// Two-sentence explanation of today's move
    async fn stock_insight(&self, quote: &StockQuote, news: &[NewsArticle]) -> AiResult<String>;

    /// Up to `count` recommendations drawn from the leading constituents
    async fn recommend(
        &self,
        constituents: &[String],
        indices: &MarketIndices,
        count: usize,
    ) -> AiResult<Vec<StockRecommendation>>;

    async fn answer(&self, question: &str, indices: &MarketIndices) -> AiResult<String>;
}

/// [`MarketAdvisor`] backed by a chat-completion model
#[derive(Clone)]
pub struct LlmAdvisor {
    client: ChatCompletionClient,
}

impl LlmAdvisor {
    pub fn new(client: ChatCompletionClient) -> Self {
        Self { client }
    }

    pub fn is_configured(&self) -> bool {
        self.client.config().is_configured()
    }
}

#[async_trait]
impl MarketAdvisor for LlmAdvisor {
    async fn stock_insight(&self, quote: &StockQuote, news: &[NewsArticle]) -> AiResult<String> {
        self.client
            .complete(
                prompts::INSIGHT_SYSTEM,
                &prompts::insight_prompt(quote, news),
                prompts::INSIGHT_MAX_TOKENS,
                prompts::TEMPERATURE,
            )
            .await
    }

    async fn recommend(
        &self,
        constituents: &[String],
        indices: &MarketIndices,
        count: usize,
    ) -> AiResult<Vec<StockRecommendation>> {
        let candidates = prompts::select_candidates(constituents, count);
        let reply = self
            .client
            .complete(
                prompts::RECOMMENDATION_SYSTEM,
                &prompts::recommendation_prompt(candidates, indices, count),
                prompts::RECOMMENDATION_MAX_TOKENS,
                prompts::TEMPERATURE,
            )
            .await?;

        let recommendations = parse_recommendations(&reply, candidates, count)?;
        tracing::debug!(
            "Decoded {} recommendations from {} candidates",
            recommendations.len(),
            candidates.len()
        );
        Ok(recommendations)
    }

    async fn answer(&self, question: &str, indices: &MarketIndices) -> AiResult<String> {
        self.client
            .complete(
                prompts::QUERY_SYSTEM,
                &prompts::query_prompt(question, indices),
                prompts::QUERY_MAX_TOKENS,
                prompts::TEMPERATURE,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AiConfig, AiError};
    use std::time::Duration;

    fn unconfigured() -> LlmAdvisor {
        LlmAdvisor::new(ChatCompletionClient::new(AiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: String::new(),
            model: "m".to_string(),
            timeout: Duration::from_secs(1),
        }))
    }

    #[tokio::test]
    async fn test_recommend_without_key_is_not_configured() {
        let advisor = unconfigured();
        assert!(!advisor.is_configured());

        let constituents = vec!["TCS".to_string()];
        let err = advisor
            .recommend(&constituents, &MarketIndices::default(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_answer_without_key_is_not_configured() {
        let err = unconfigured()
            .answer("Is IT a good sector?", &MarketIndices::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::NotConfigured(_)));
    }
}
