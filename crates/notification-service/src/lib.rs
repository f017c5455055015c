use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A triggered alert, as delivered to a webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertNotification {
    pub alert_id: i64,
    pub stock_symbol: String,
    pub trigger_type: String,
    pub trigger_value: String,
    pub notification_channel: String,
    pub triggered_at: DateTime<Utc>,
}

impl AlertNotification {
    /// One-line human readable summary, used as the `message` field of the payload
    pub fn message(&self) -> String {
        let trigger = self.trigger_type.replace('_', " ");
        format!(
            "Alert #{}: {} {} trigger ({}) fired at {}",
            self.alert_id,
            self.stock_symbol,
            trigger,
            self.trigger_value,
            self.triggered_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }

    fn payload(&self) -> serde_json::Value {
        let mut payload = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("message".to_string(), self.message().into());
        }
        payload
    }
}

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, notification: &AlertNotification) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

/// Errors from the notification system.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Webhook error: {0}")]
    Webhook(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Configuration for the notification service.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub default_webhook_url: Option<String>,
    pub timeout: Duration,
}

impl NotificationConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        Self {
            default_webhook_url: std::env::var("ALERT_WEBHOOK_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Posts the notification as JSON to a Zapier/Make style webhook.
pub struct WebhookNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(webhook_url: impl Into<String>, client: reqwest::Client) -> Result<Self, NotificationError> {
        let webhook_url = webhook_url.into();
        reqwest::Url::parse(&webhook_url)
            .map_err(|e| NotificationError::Config(format!("invalid webhook url '{}': {}", webhook_url, e)))?;

        Ok(Self { webhook_url, client })
    }
}

#[async_trait]
impl NotificationChannel for WebhookNotifier {
    async fn send(&self, notification: &AlertNotification) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&notification.payload())
            .send()
            .await
            .map_err(|e| NotificationError::Webhook(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotificationError::Webhook(format!("HTTP {}", response.status())));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

/// Delivers triggered alerts to the alert's own webhook or the configured default.
#[derive(Clone)]
pub struct NotificationService {
    default_webhook_url: Option<String>,
    client: reqwest::Client,
}

impl NotificationService {
    pub fn new(config: &NotificationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        if config.default_webhook_url.is_some() {
            tracing::info!("Default alert webhook enabled");
        } else {
            tracing::info!("No default alert webhook configured (set ALERT_WEBHOOK_URL)");
        }

        Self {
            default_webhook_url: config.default_webhook_url.clone(),
            client,
        }
    }

    /// Send `notification`, awaiting completion. Returns whether it was delivered.
    pub async fn deliver(&self, notification: &AlertNotification, webhook_url: Option<&str>) -> bool {
        let target = webhook_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .or(self.default_webhook_url.as_deref());

        let Some(url) = target else {
            tracing::debug!("No webhook for alert {}, skipping notification", notification.alert_id);
            return false;
        };

        let notifier = match WebhookNotifier::new(url, self.client.clone()) {
            Ok(notifier) => notifier,
            Err(e) => {
                tracing::warn!("Cannot notify for alert {}: {}", notification.alert_id, e);
                return false;
            }
        };

        match notifier.send(notification).await {
            Ok(()) => {
                tracing::debug!("Sent {} notification for alert {}", notifier.name(), notification.alert_id);
                true
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to send {} notification for alert {}: {}",
                    notifier.name(),
                    notification.alert_id,
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn notification() -> AlertNotification {
        AlertNotification {
            alert_id: 12,
            stock_symbol: "TCS".to_string(),
            trigger_type: "ai_recommendation".to_string(),
            trigger_value: "buy".to_string(),
            notification_channel: "whatsapp".to_string(),
            triggered_at: DateTime::parse_from_rfc3339("2024-05-01T09:15:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    fn service(default_webhook_url: Option<String>) -> NotificationService {
        NotificationService::new(&NotificationConfig {
            default_webhook_url,
            timeout: Duration::from_secs(2),
        })
    }

    /// Accept one request, answer with `status`, and hand back the request body
    async fn one_shot_server(status: u16) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            let body_start = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let headers = String::from_utf8_lossy(&buf[..body_start]).to_lowercase();
            let length: usize = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);
            while buf.len() < body_start + length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let end = buf.len().min(body_start + length);

            let response = format!("HTTP/1.1 {} X\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", status);
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf[body_start..end]).to_string()
        });

        (url, handle)
    }

    #[test]
    fn test_message_summary() {
        assert_eq!(
            notification().message(),
            "Alert #12: TCS ai recommendation trigger (buy) fired at 2024-05-01 09:15:00 UTC"
        );
    }

    #[tokio::test]
    async fn test_no_webhook_is_not_sent() {
        assert!(!service(None).deliver(&notification(), None).await);
        assert!(!service(None).deliver(&notification(), Some("   ")).await);
    }

    #[test]
    fn test_webhook_notifier_validates_url() {
        let notifier = WebhookNotifier::new("https://hooks.example.com/a", reqwest::Client::new()).unwrap();
        assert_eq!(notifier.name(), "webhook");

        let err = WebhookNotifier::new("not a url", reqwest::Client::new()).err().unwrap();
        assert!(matches!(err, NotificationError::Config(_)));
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_sent() {
        assert!(!service(None).deliver(&notification(), Some("not a url")).await);
    }

    #[tokio::test]
    async fn test_delivers_payload_to_alert_webhook() {
        let (url, server) = one_shot_server(200).await;
        let sent = service(Some("http://127.0.0.1:9/unused".to_string()))
            .deliver(&notification(), Some(&url))
            .await;
        assert!(sent);

        let body: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(body["alert_id"], 12);
        assert_eq!(body["stock_symbol"], "TCS");
        assert_eq!(body["notification_channel"], "whatsapp");
        assert!(body["message"].as_str().unwrap().starts_with("Alert #12"));
    }

    #[tokio::test]
    async fn test_falls_back_to_default_webhook() {
        let (url, server) = one_shot_server(200).await;
        assert!(service(Some(url)).deliver(&notification(), None).await);
        assert!(!server.await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_failure() {
        let (url, server) = one_shot_server(500).await;
        assert!(!service(None).deliver(&notification(), Some(&url)).await);
        server.await.unwrap();
    }
}
