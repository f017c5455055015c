use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI service is not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AiResult<T> = Result<T, AiError>;
