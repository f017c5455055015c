use serde::{Deserialize, Serialize};

use crate::error::{AiError, AiResult};
use crate::AiConfig;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Thin client for `POST {base_url}/chat/completions`.
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: reqwest::Client,
    config: AiConfig,
}

impl ChatCompletionClient {
    pub fn new(config: AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, config }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Send one system + user exchange and return the trimmed reply text
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> AiResult<String> {
        if !self.config.is_configured() {
            return Err(AiError::NotConfigured("AI_API_KEY is not set".to_string()));
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url.trim_end_matches('/')))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::ServiceUnavailable(format!("HTTP {}: {}", status, body)));
        }

        let body: ChatResponse = response.json().await?;
        extract_content(body)
    }
}

fn extract_content(body: ChatResponse) -> AiResult<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| AiError::InvalidResponse("completion has no message content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(api_key: &str, base_url: &str) -> AiConfig {
        AiConfig {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: "test-model".to_string(),
            timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest {
            model: "gemini-2.5-flash",
            messages: [
                ChatMessage { role: "system", content: "sys" },
                ChatMessage { role: "user", content: "hi" },
            ],
            max_tokens: 150,
            temperature: 0.7,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gemini-2.5-flash");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["max_tokens"], 150);
    }

    #[test]
    fn test_extract_content_trims() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"  hello \n"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(body).unwrap(), "hello");
    }

    #[test]
    fn test_extract_content_empty_choices() {
        let body: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(extract_content(body), Err(AiError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let client = ChatCompletionClient::new(config("  ", "http://127.0.0.1:9"));
        let err = client.complete("s", "u", 10, 0.7).await.unwrap_err();
        assert!(matches!(err, AiError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_request_failure() {
        let client = ChatCompletionClient::new(config("key", "http://127.0.0.1:9"));
        let err = client.complete("s", "u", 10, 0.7).await.unwrap_err();
        assert!(matches!(err, AiError::RequestFailed(_)));
    }
}
