use ai_client::AiConfig;
use anyhow::{Context, Result};
use market_data_client::AngelOneConfig;
use news_client::NewsConfig;
use notification_service::NotificationConfig;
use std::env;
use std::time::Duration;

const DEFAULT_OAUTH_CLIENT_ID: &str = "demo_client_id";

/// Everything the server reads from the environment at start-up
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub http_timeout: Duration,
    pub market: AngelOneConfig,
    pub news: NewsConfig,
    pub ai: AiConfig,
    pub notifications: NotificationConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .context("PORT must be a valid port number")?;
        let timeout_secs: u64 = env::var("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?;
        let http_timeout = Duration::from_secs(timeout_secs);

        let mut market = AngelOneConfig::default();
        if let Some(mock) = parse_bool_var("MARKET_DATA_MOCK")? {
            market.mock_mode = mock;
        }
        market.timeout = http_timeout;

        let mut news = NewsConfig::default();
        if let Some(mock) = parse_bool_var("NEWS_MOCK")? {
            news.mock_mode = mock;
        }
        news.timeout = http_timeout;

        let ai = AiConfig {
            timeout: http_timeout,
            ..AiConfig::default()
        };

        let mut notifications = NotificationConfig::from_env();
        notifications.timeout = http_timeout;

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:dashboard.db".to_string()),
            http_timeout,
            market,
            news,
            ai,
            notifications,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Client id shown on the brokerage login page
    pub fn oauth_client_id(&self) -> String {
        if self.market.client_id.is_empty() {
            DEFAULT_OAUTH_CLIENT_ID.to_string()
        } else {
            self.market.client_id.clone()
        }
    }
}

/// `None` when unset; an error when set to something other than a boolean
fn parse_bool_var(name: &str) -> Result<Option<bool>> {
    match env::var(name) {
        Ok(raw) => parse_bool(&raw)
            .map(Some)
            .with_context(|| format!("{} must be true/false, got '{}'", name, raw)),
        Err(_) => Ok(None),
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow::anyhow!("not a boolean: {}", other)),
    }
}
